//! Declarative form configuration
//!
//! A form is a named sequence of steps; each step lays out fields in rows and
//! columns. This module models that configuration and derives from it what
//! the step controller needs: lookup, navigation, page meta and per-step
//! submission schemas.

pub mod config;
pub mod meta;
pub mod navigation;
pub mod schema;
pub mod validation;

pub use config::{
    Column, Field, FieldKind, FieldOption, FormCatalog, FormConfig, MaskType, PageMeta, Row,
    Step, StepButtons,
};
pub use meta::MetaDescriptor;
pub use navigation::StepNavigation;
pub use schema::{FieldErrors, StepSchema};
pub use validation::ValidatorKey;
