// # Google Drive Blob Store
//
// Drive v3 adapter for the vidlink engine. The adapter is isolated,
// stateless and single-shot: it makes its HTTP calls, classifies the
// response and returns. All coordination (credential refresh, the
// retry-once-after-refresh policy, registry writes, broadcasting) is
// owned by `VideoEngine`.
//
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - Expired/revoked grants surface as `Error::AuthExpired` so callers can
//   trigger a reconnect instead of pattern-matching message strings
// - NO retry logic (owned by VideoEngine)
// - NO caching (owned by the registry tiers)
// - NO background tasks
//
// ## Security Requirements
//
// - OAuth tokens NEVER appear in logs or Debug output
// - Credentials MUST be provided via environment variables only
//
// ## API Reference
//
// - Create file metadata: POST `/drive/v3/files`
// - Upload content:       PATCH `/upload/drive/v3/files/:id?uploadType=media`
// - Share publicly:       POST `/drive/v3/files/:id/permissions`
// - Delete file:          DELETE `/drive/v3/files/:id`
// - Connectivity check:   GET `/drive/v3/about?fields=user`

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;

use vidlink_core::traits::{BlobStore, CredentialProvider};
use vidlink_core::{Error, Result};

pub mod credentials;

pub use credentials::DriveCredentials;

/// Drive API base URL (metadata operations)
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive upload endpoint base URL (content operations)
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Drive blob store
///
/// Holds a `CredentialProvider` rather than a raw token so every request
/// picks up the current access token; the provider owns caching and
/// refresh, this adapter never does.
pub struct DriveBlobStore {
    credentials: Arc<dyn CredentialProvider>,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the credential provider
impl std::fmt::Debug for DriveBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveBlobStore")
            .field("credentials", &"<REDACTED>")
            .finish()
    }
}

impl DriveBlobStore {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(&format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            client,
        })
    }

    /// Map a non-success Drive response to a structured error.
    ///
    /// 401/403 and `invalid_grant` bodies become `AuthExpired` so the engine
    /// can refresh and retry; everything else stays a blob-store error with
    /// the status for context.
    fn classify_failure(status: reqwest::StatusCode, body: &str, context: &str) -> Error {
        if is_auth_failure(status.as_u16(), body) {
            return Error::auth_expired(&format!(
                "{}: credentials rejected (status {})",
                context, status
            ));
        }
        match status.as_u16() {
            404 => Error::not_found(&format!("{}: file not found", context)),
            429 => Error::blob_store(&format!(
                "{}: rate limit exceeded, retry later (status {})",
                context, status
            )),
            500..=599 => Error::blob_store(&format!(
                "{}: Drive server error (transient): {} - {}",
                context, status, body
            )),
            _ => Error::blob_store(&format!("{}: {} - {}", context, status, body)),
        }
    }

    async fn failure(response: reqwest::Response, context: &str) -> Error {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error response".to_string());
        Self::classify_failure(status, &body, context)
    }

    /// Create the file's metadata entry inside the configured folder.
    async fn create_metadata(
        &self,
        token: &str,
        name: &str,
        container_id: &str,
    ) -> Result<String> {
        let url = format!("{}/files", DRIVE_API_BASE);
        let payload = serde_json::json!({
            "name": name,
            "parents": [container_id],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("metadata create request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "metadata create").await);
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::blob_store(&format!("failed to parse create response: {}", e)))?;

        let file_id = json["id"]
            .as_str()
            .ok_or_else(|| Error::blob_store("invalid create response: id is not a string"))?;

        tracing::debug!(file_id, "created Drive metadata entry");
        Ok(file_id.to_string())
    }

    /// Push the file content into an existing metadata entry.
    async fn upload_content(
        &self,
        token: &str,
        file_id: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/files/{}?uploadType=media",
            DRIVE_UPLOAD_BASE, file_id
        );

        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("content upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "content upload").await);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for DriveBlobStore {
    /// Upload a payload as a new Drive file under `container_id`.
    ///
    /// Two calls: metadata create, then a media upload into the new id.
    /// If the content upload fails the metadata entry is left behind;
    /// the caller sees the error and never registers the file, so the
    /// orphan is invisible to viewers.
    async fn create(
        &self,
        bytes: Bytes,
        name: &str,
        mime_type: &str,
        container_id: &str,
    ) -> Result<String> {
        let token = self.credentials.bearer().await?;

        tracing::info!(name, size = bytes.len(), "uploading file to Drive");

        let file_id = self.create_metadata(&token, name, container_id).await?;
        self.upload_content(&token, &file_id, bytes, mime_type).await?;

        tracing::info!(name, file_id, "Drive upload complete");
        Ok(file_id)
    }

    /// Grant anyone-with-the-link read access.
    ///
    /// ```http
    /// POST /drive/v3/files/:id/permissions
    /// { "role": "reader", "type": "anyone" }
    /// ```
    async fn set_public_read(&self, blob_id: &str) -> Result<()> {
        let token = self.credentials.bearer().await?;
        let url = format!("{}/files/{}/permissions", DRIVE_API_BASE, blob_id);
        let payload = serde_json::json!({
            "role": "reader",
            "type": "anyone",
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("permission request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "set permission").await);
        }

        tracing::debug!(blob_id, "file shared publicly");
        Ok(())
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        let token = self.credentials.bearer().await?;
        let url = format!("{}/files/{}", DRIVE_API_BASE, blob_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("delete request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "delete").await);
        }

        tracing::info!(blob_id, "Drive file deleted");
        Ok(())
    }

    /// Cheap connectivity/credential probe.
    async fn about(&self) -> Result<()> {
        let token = self.credentials.bearer().await?;
        let url = format!("{}/about?fields=user", DRIVE_API_BASE);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::blob_store(&format!("about request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "about").await);
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "gdrive"
    }
}

/// Whether a response means the grant is expired or revoked.
///
/// Google reports this either as a 401/403 status or as an
/// `invalid_grant` error body on the token endpoint; both mean the
/// stored credentials can no longer be used and the operator has to
/// reconnect the account.
pub(crate) fn is_auth_failure(status: u16, body: &str) -> bool {
    matches!(status, 401 | 403) || body.contains("invalid_grant")
}
