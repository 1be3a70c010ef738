//! Error types for staybook.

use thiserror::Error;

/// Errors that can occur in staybook operations.
#[derive(Error, Debug)]
pub enum StaybookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot move {kind} from '{from}' to '{to}'")]
    InvalidTransition {
        kind: &'static str,
        from: String,
        to: String,
    },

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StaybookError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StaybookError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result type alias for staybook operations.
pub type StaybookResult<T> = Result<T, StaybookError>;
