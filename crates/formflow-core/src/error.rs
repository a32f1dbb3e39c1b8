//! Error types for FormFlow Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Form lookup errors (user-visible "not found")
    #[error("Form not found: {0}")]
    FormNotFound(String),

    #[error("Step not found: {form_id}/{step_slug}")]
    StepNotFound { form_id: String, step_slug: String },

    // Session errors
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration not found")]
    ConfigNotFound,

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    // Database errors (connection, migrations)
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should surface as a user-visible "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::FormNotFound(_) | Error::StepNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
