//! Error types for the translation engine
//!
//! Every fallible operation in the crate returns [`AppError`]. The variants
//! mirror the failure classes callers need to tell apart: configuration
//! problems are caught before any network call, transport failures carry the
//! provider's own message, and persistence failures are kept distinct so the
//! caller knows the operation was not committed.

use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing API key, unknown provider or invalid configuration value
    #[error("{0}")]
    Configuration(String),

    /// Non-2xx provider response, connection failure or unreadable body
    #[error("{0}")]
    Transport(String),

    /// Tool-call arguments could not be decoded into an assistant action
    #[error("Could not understand the assistant's tool call: {0}")]
    ActionDecode(String),

    /// Error from the saved-translation store
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::store::PersistenceError),

    /// A project, record or glossary entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied input was rejected (blank name, duplicate term, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for unexpected errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error came from talking to the provider
    ///
    /// Decode failures count as provider failures: the provider answered,
    /// but with something unusable.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::ActionDecode(_))
    }
}
