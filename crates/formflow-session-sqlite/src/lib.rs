//! SQLite session record store for single-node FormFlow deployments
//!
//! Records live in a `form_sessions` table with the field data stored as a
//! JSON text column. The database runs in WAL mode and carries a
//! `schema_version` table checked on startup.

mod sqlite_session_store;

pub use sqlite_session_store::SqliteSessionStore;
