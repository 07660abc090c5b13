// # Credential Provider Trait
//
// Supplies bearer credentials for blob-store calls.
//
// ## Purpose
//
// The OAuth dance itself is outside this core. What the engine needs is a
// bearer usable right now, a way to ask whether it is about to expire, and
// a refresh operation to run before (or once after) a failed call.
//
// An absent or invalid credential is reported as
// [`crate::Error::AuthExpired`], which the engine surfaces to callers as a
// "reconnect required" condition.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for credential source implementations
///
/// Implementations must be thread-safe; `refresh` may be called
/// concurrently with `bearer` and should replace the credential atomically.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: a token believed to be usable
    /// - `Err(Error::AuthExpired)`: no usable credential; the caller must
    ///   reconnect
    async fn bearer(&self) -> Result<String>;

    /// Whether the credential is close enough to expiry that a proactive
    /// refresh is warranted.
    async fn is_expiring(&self) -> bool;

    /// Obtain a fresh credential from the upstream grant.
    async fn refresh(&self) -> Result<()>;
}

/// Fixed-token credential source.
///
/// Never expires and refreshes to itself. Used by tests and embedded
/// setups where the token lifecycle is managed elsewhere.
#[derive(Clone)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// A provider that always yields the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A provider with no credential at all ("not connected").
    pub fn disconnected() -> Self {
        Self { token: None }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer(&self) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| Error::auth_expired("no credential configured"))
    }

    async fn is_expiring(&self) -> bool {
        false
    }

    async fn refresh(&self) -> Result<()> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(Error::auth_expired("no credential to refresh")),
        }
    }
}
