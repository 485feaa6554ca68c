//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration error (unknown backend, missing secret, bad env value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cookie present but its signature did not verify
    #[error("Invalid cookie signature")]
    InvalidSignature,

    /// Cookie verified but did not carry a well-formed session key
    #[error("Invalid session key: {0}")]
    InvalidSessionKey(String),

    /// Filesystem error from the file backend
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl SessionError {
    /// Whether this error means a stored record could not be written or read.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            SessionError::Io(_) | SessionError::Serialization(_) | SessionError::Deserialization(_)
        )
    }
}
