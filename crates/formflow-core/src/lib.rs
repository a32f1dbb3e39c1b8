//! FormFlow Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout FormFlow:
//! - Session data model (flat field values, session records)
//! - The `SessionRecordStore` trait and an in-memory implementation
//! - The session token and its signed codec
//! - The Form Session Manager (resolve / merge / destroy)
//! - Declarative form configuration, step schemas and validators
//! - Core error types

pub mod config_store;
pub mod error;
pub mod form;
pub mod manager;
pub mod memory_store;
pub mod record;
pub mod session_store;
pub mod token;
pub mod value;

pub use config_store::FormConfigStore;
pub use error::{Error, Result};
pub use manager::{FormSessionManager, MergeOutcome, PersistedSession};
pub use memory_store::InMemorySessionStore;
pub use record::{FormId, NewSessionRecord, RecordId, SessionRecord};
pub use session_store::{CleanupStats, SessionRecordStore};
pub use token::{SessionToken, TokenCodec};
pub use value::{FieldValue, SessionData};
