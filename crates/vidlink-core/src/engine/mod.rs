//! Upload/delete engine
//!
//! The engine drives the external blob store and the registry together:
//!
//! ```text
//! upload ──▶ BlobStore::create ──▶ set_public_read ──▶ generate number
//!                 │ (any failure aborts, no registry write)
//!                 ▼
//!          VideoRegistry::add ──▶ ChangeBroadcaster::publish
//!
//! delete ──▶ BlobStore::delete (remote FIRST)
//!                 │ (failure leaves registries untouched)
//!                 ▼
//!          VideoRegistry::delete ──▶ ChangeBroadcaster::publish
//! ```
//!
//! The engine owns the credential policy: a proactive refresh when the
//! provider reports expiry, and exactly one refresh-then-retry after a
//! call fails with [`Error::AuthExpired`]. Collaborators stay single-shot
//! and never retry on their own.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::broadcast::ChangeBroadcaster;
use crate::error::{Error, Result};
use crate::record::{Resolution, VideoListing, VideoRecord};
use crate::registry::VideoRegistry;
use crate::traits::{BlobStore, CredentialProvider};

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// Public viewer link
    pub link: String,
    /// Opaque blob identifier
    pub id: String,
    /// Assigned public number
    pub number: String,
    /// Original filename
    pub name: String,
}

/// Result of resolving a public identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    /// Blob identifier to stream from
    #[serde(rename = "driveId")]
    pub drive_id: String,
    /// Whether the identifier bypassed the registry (legacy direct link)
    #[serde(rename = "isDirect")]
    pub is_direct: bool,
}

/// Engine coordinating blob store, registry and broadcaster
pub struct VideoEngine {
    blob_store: Arc<dyn BlobStore>,
    credentials: Arc<dyn CredentialProvider>,
    registry: Arc<VideoRegistry>,
    broadcaster: Arc<ChangeBroadcaster>,
    base_url: String,
    container_id: String,
}

impl VideoEngine {
    /// Create a new engine.
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        credentials: Arc<dyn CredentialProvider>,
        registry: Arc<VideoRegistry>,
        broadcaster: Arc<ChangeBroadcaster>,
        base_url: impl Into<String>,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            blob_store,
            credentials,
            registry,
            broadcaster,
            base_url: base_url.into(),
            container_id: container_id.into(),
        }
    }

    /// Upload a payload: blob creation, public permission, registry add,
    /// broadcast.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthExpired`] when the credential is unusable even after
    ///   one refresh; callers should surface a reconnect hint
    /// - [`Error::InvalidInput`] for an empty payload
    /// - [`Error::BlobStore`] for remote failures; the registry is left
    ///   untouched in every failure case
    pub async fn upload(&self, bytes: Bytes, name: &str, mime_type: &str) -> Result<UploadOutcome> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("no file payload supplied"));
        }

        self.refresh_if_expiring().await;
        self.credentials.bearer().await?;

        let drive_id = self
            .with_refresh_retry(|| {
                let bytes = bytes.clone();
                async move {
                    let blob_id = self
                        .blob_store
                        .create(bytes, name, mime_type, &self.container_id)
                        .await?;
                    self.blob_store.set_public_read(&blob_id).await?;
                    Ok(blob_id)
                }
            })
            .await?;

        let size = u64::try_from(bytes.len()).ok();
        let number = self.registry.generate_number().await;
        let record = VideoRecord::new(drive_id.clone(), name, size);
        self.registry.add(&number, &record).await;

        self.broadcast_snapshot().await;

        info!("Uploaded {} as #{} ({})", name, number, drive_id);
        Ok(UploadOutcome {
            link: format!("{}/?video={}", self.base_url.trim_end_matches('/'), number),
            id: drive_id,
            number,
            name: name.to_string(),
        })
    }

    /// Delete a video by public number or blob identifier.
    ///
    /// The remote blob is deleted before either registry tier is touched;
    /// a remote failure leaves the registries exactly as they were.
    pub async fn remove(&self, identifier: &str) -> Result<()> {
        self.refresh_if_expiring().await;
        self.credentials.bearer().await?;

        let resolution = self
            .registry
            .find_by_identifier(identifier)
            .await
            .ok_or_else(|| Error::not_found(format!("no video matches {}", identifier)))?;
        let drive_id = resolution.drive_id().to_string();

        self.with_refresh_retry(|| {
            let drive_id = drive_id.clone();
            async move { self.blob_store.delete(&drive_id).await }
        })
        .await?;

        // Remote is gone; drop whichever tier still holds the record. Both
        // the original identifier and the blob id are tried so a
        // direct-reference delete still clears registry entries.
        let removed = self.registry.delete(identifier).await || {
            drive_id != identifier && self.registry.delete(&drive_id).await
        };
        if !removed {
            warn!("Remote blob {} deleted but no registry entry dropped", drive_id);
        }

        self.broadcast_snapshot().await;
        info!("Deleted {} ({})", identifier, drive_id);
        Ok(())
    }

    /// Admin listing with blob-store viewer links.
    pub async fn list(&self) -> Vec<VideoListing> {
        self.registry
            .list(&self.base_url)
            .await
            .into_iter()
            .map(VideoListing::with_drive_link)
            .collect()
    }

    /// Resolve an identifier for playback, bumping the view counter
    /// best-effort on registry hits. `None` is the not-found signal.
    pub async fn resolve(&self, identifier: &str) -> Option<Resolved> {
        match self.registry.find_by_identifier(identifier).await? {
            Resolution::Direct { drive_id } => Some(Resolved {
                drive_id,
                is_direct: true,
            }),
            Resolution::Stored { number, record } => {
                self.registry.increment_views(&number).await;
                Some(Resolved {
                    drive_id: record.drive_id,
                    is_direct: false,
                })
            }
        }
    }

    /// Bulk import: per-entry best-effort dual upsert, one trailing
    /// broadcast. Used by the migration path.
    pub async fn import(&self, entries: Vec<(String, VideoRecord)>) {
        let count = entries.len();
        for (number, record) in &entries {
            self.registry.add(number, record).await;
        }
        self.broadcast_snapshot().await;
        info!("Imported {} record(s)", count);
    }

    /// Subscribe to live registry updates.
    pub async fn subscribe(&self) -> tokio::sync::mpsc::Receiver<crate::broadcast::Envelope> {
        self.broadcaster.subscribe().await
    }

    /// Probe the blob store with the current credentials.
    ///
    /// Used at startup so a dead grant shows up in the logs before the
    /// first upload does.
    pub async fn check_connection(&self) -> Result<()> {
        self.refresh_if_expiring().await;
        self.with_refresh_retry(|| async { self.blob_store.about().await })
            .await
    }

    /// Refresh proactively when the provider reports imminent expiry.
    async fn refresh_if_expiring(&self) {
        if self.credentials.is_expiring().await {
            if let Err(e) = self.credentials.refresh().await {
                warn!("Proactive credential refresh failed: {}", e);
            }
        }
    }

    /// Run `op`; on [`Error::AuthExpired`], refresh once and retry once.
    async fn with_refresh_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Err(e) if e.requires_reconnect() => {
                info!("Operation failed with expired credentials, refreshing and retrying once");
                self.credentials.refresh().await?;
                op().await
            }
            other => other,
        }
    }

    async fn broadcast_snapshot(&self) {
        let videos = self.registry.list(&self.base_url).await;
        self.broadcaster.publish_videos_updated(videos).await;
    }
}

impl std::fmt::Debug for VideoEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEngine")
            .field("blob_store", &self.blob_store.store_name())
            .field("base_url", &self.base_url)
            .field("container_id", &self.container_id)
            .finish_non_exhaustive()
    }
}
