// # Google OAuth2 Credentials
//
// Refresh-token credential provider for the Drive adapter. Holds the
// long-lived refresh token from the operator's one-time consent flow and
// exchanges it for short-lived access tokens on demand.
//
// A rejected exchange (`invalid_grant`) means the grant itself is expired
// or revoked; that surfaces as `Error::AuthExpired` so the caller knows a
// full reconnect is needed, not another refresh.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use vidlink_core::traits::CredentialProvider;
use vidlink_core::{Error, Result};

use crate::is_auth_failure;

/// Google OAuth2 token endpoint
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the access token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// Default HTTP timeout for the token endpoint (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

struct TokenState {
    access_token: Option<String>,
    expires_at: Option<Instant>,
}

/// Refresh-token backed credential provider for Google APIs
pub struct DriveCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: reqwest::Client,
    state: RwLock<TokenState>,
}

// Custom Debug implementation that hides all secrets
impl std::fmt::Debug for DriveCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("refresh_token", &"<REDACTED>")
            .finish()
    }
}

impl DriveCredentials {
    /// Create a provider from an OAuth client and a stored refresh token.
    ///
    /// No access token exists yet; the first `bearer` caller must be
    /// preceded by a `refresh`, which the engine does via `is_expiring`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let refresh_token = refresh_token.into();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::config("OAuth client id and secret are required"));
        }
        if refresh_token.is_empty() {
            return Err(Error::config("OAuth refresh token is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(&format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client_id,
            client_secret,
            refresh_token,
            client,
            state: RwLock::new(TokenState {
                access_token: None,
                expires_at: None,
            }),
        })
    }
}

#[async_trait]
impl CredentialProvider for DriveCredentials {
    async fn bearer(&self) -> Result<String> {
        let state = self.state.read().await;
        match (&state.access_token, state.expires_at) {
            (Some(token), Some(expires_at)) if Instant::now() < expires_at => Ok(token.clone()),
            _ => Err(Error::auth_expired("no valid access token; refresh required")),
        }
    }

    async fn is_expiring(&self) -> bool {
        let state = self.state.read().await;
        match state.expires_at {
            Some(expires_at) => Instant::now() + EXPIRY_MARGIN >= expires_at,
            None => true,
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// ```http
    /// POST /token
    /// grant_type=refresh_token&client_id=...&client_secret=...&refresh_token=...
    /// ```
    async fn refresh(&self) -> Result<()> {
        tracing::debug!("refreshing Drive access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());

            if is_auth_failure(status.as_u16(), &body) {
                // The grant itself is dead; only a full reconnect helps
                return Err(Error::auth_expired(&format!(
                    "token refresh rejected (status {})",
                    status
                )));
            }
            return Err(Error::blob_store(&format!(
                "token refresh failed: {} - {}",
                status, body
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::blob_store(&format!("failed to parse token response: {}", e)))?;

        let access_token = json["access_token"]
            .as_str()
            .ok_or_else(|| Error::blob_store("invalid token response: access_token missing"))?;
        let expires_in = json["expires_in"].as_u64().unwrap_or(3600);

        let mut state = self.state.write().await;
        state.access_token = Some(access_token.to_string());
        state.expires_at = Some(Instant::now() + Duration::from_secs(expires_in));

        tracing::info!(expires_in, "Drive access token refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_client_config_is_rejected() {
        assert!(DriveCredentials::new("", "secret", "rt").is_err());
        assert!(DriveCredentials::new("id", "", "rt").is_err());
        assert!(DriveCredentials::new("id", "secret", "").is_err());
    }

    #[tokio::test]
    async fn fresh_provider_is_expiring_and_has_no_bearer() {
        let creds = DriveCredentials::new("id", "secret", "rt").unwrap();

        assert!(creds.is_expiring().await);
        let err = creds.bearer().await.unwrap_err();
        assert!(err.requires_reconnect());
    }

    #[tokio::test]
    async fn cached_token_is_served_until_margin() {
        let creds = DriveCredentials::new("id", "secret", "rt").unwrap();
        {
            let mut state = creds.state.write().await;
            state.access_token = Some("tok".to_string());
            state.expires_at = Some(Instant::now() + Duration::from_secs(3600));
        }

        assert_eq!(creds.bearer().await.unwrap(), "tok");
        assert!(!creds.is_expiring().await);
    }

    #[tokio::test]
    async fn token_inside_margin_reports_expiring() {
        let creds = DriveCredentials::new("id", "secret", "rt").unwrap();
        {
            let mut state = creds.state.write().await;
            state.access_token = Some("tok".to_string());
            // Valid, but inside the 5-minute refresh margin
            state.expires_at = Some(Instant::now() + Duration::from_secs(60));
        }

        assert!(creds.bearer().await.is_ok());
        assert!(creds.is_expiring().await);
    }

    #[test]
    fn secrets_not_exposed_in_debug() {
        let creds = DriveCredentials::new("client-id", "super_secret", "refresh_secret").unwrap();
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("client-id"));
        assert!(!debug_str.contains("super_secret"));
        assert!(!debug_str.contains("refresh_secret"));
    }
}
