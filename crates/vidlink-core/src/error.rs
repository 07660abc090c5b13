//! Error types for the vidlink system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for vidlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the vidlink system
#[derive(Error, Debug)]
pub enum Error {
    /// Primary (flat-file) store errors
    #[error("Primary store error: {0}")]
    PrimaryStore(String),

    /// Secondary (document) store errors
    #[error("Secondary store error: {0}")]
    SecondaryStore(String),

    /// External blob store errors (network, quota, permission)
    #[error("Blob store error: {0}")]
    BlobStore(String),

    /// Credential invalid or expired; the caller must reconnect
    #[error("Credentials expired or invalid: {0}")]
    AuthExpired(String),

    /// Record or blob not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (e.g. empty upload payload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a primary store error
    pub fn primary_store(msg: impl Into<String>) -> Self {
        Self::PrimaryStore(msg.into())
    }

    /// Create a secondary store error
    pub fn secondary_store(msg: impl Into<String>) -> Self {
        Self::SecondaryStore(msg.into())
    }

    /// Create a blob store error
    pub fn blob_store(msg: impl Into<String>) -> Self {
        Self::BlobStore(msg.into())
    }

    /// Create a credential-expiry error
    pub fn auth_expired(msg: impl Into<String>) -> Self {
        Self::AuthExpired(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this failure means the external credential must be
    /// re-established before the operation can succeed.
    ///
    /// Adapters classify credential expiry at the HTTP boundary and produce
    /// [`Error::AuthExpired`]; callers branch on this instead of inspecting
    /// error text.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
