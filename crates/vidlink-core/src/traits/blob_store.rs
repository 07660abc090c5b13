// # Blob Store Trait
//
// Defines the interface to the external cloud file store.
//
// ## Purpose
//
// The blob store holds the actual video bytes. This core only ever passes
// its opaque identifiers back to it; it never interprets them.
//
// ## Implementations
//
// - Google Drive: `vidlink-blob-gdrive` crate
// - Test doubles live alongside the contract tests

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Trait for external blob store implementations
///
/// Implementations perform single-shot API calls and propagate failures to
/// the engine, which owns the refresh-then-retry policy. They must be
/// thread-safe and usable across async tasks.
///
/// # Error classification
///
/// Implementations classify failures at their own boundary:
/// [`crate::Error::AuthExpired`] for invalid/expired credentials,
/// [`crate::Error::NotFound`] for missing blobs, and
/// [`crate::Error::BlobStore`] for everything else. The engine branches on
/// these kinds, never on error text.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a payload and return the store's opaque identifier.
    ///
    /// # Parameters
    ///
    /// - `bytes`: the full file payload
    /// - `name`: original filename, stored as display metadata
    /// - `mime_type`: payload content type
    /// - `container_id`: the folder/container to create the blob under
    async fn create(
        &self,
        bytes: Bytes,
        name: &str,
        mime_type: &str,
        container_id: &str,
    ) -> Result<String>;

    /// Grant anonymous read access to a blob.
    async fn set_public_read(&self, blob_id: &str) -> Result<()>;

    /// Delete a blob by its opaque identifier.
    ///
    /// Returns [`crate::Error::NotFound`] when the blob does not exist.
    async fn delete(&self, blob_id: &str) -> Result<()>;

    /// Lightweight connectivity probe.
    async fn about(&self) -> Result<()>;

    /// Short name for logging (e.g. "gdrive").
    fn store_name(&self) -> &'static str;
}
