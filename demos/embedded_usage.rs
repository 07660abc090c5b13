//! Minimal embedding example for vidlink-core
//!
//! This example demonstrates using vidlink-core as a library in a custom
//! application: a custom blob store, static credentials, an in-memory
//! secondary tier and a live update subscriber, with the engine lifecycle
//! fully managed by the application.

use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vidlink_core::config::{EngineConfig, PrimaryStoreConfig, SecondaryStoreConfig, VidlinkConfig};
use vidlink_core::store::{FileStore, MemoryDocumentStore, SecondaryHandle};
use vidlink_core::traits::{BlobStore, StaticCredentials};
use vidlink_core::{ChangeBroadcaster, Envelope, Result, VideoEngine, VideoRegistry};

/// Custom blob store for embedded usage
///
/// Stores nothing; hands out sequential identifiers shaped like real
/// opaque blob ids and counts calls.
struct EmbeddedBlobStore {
    next_id: AtomicUsize,
}

impl EmbeddedBlobStore {
    fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for EmbeddedBlobStore {
    async fn create(
        &self,
        bytes: Bytes,
        name: &str,
        _mime_type: &str,
        _container_id: &str,
    ) -> Result<String> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        println!("[Embedded] Storing {} ({} bytes)", name, bytes.len());
        Ok(format!("embedded{:0>24}", n))
    }

    async fn set_public_read(&self, blob_id: &str) -> Result<()> {
        println!("[Embedded] Sharing {} publicly", blob_id);
        Ok(())
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        println!("[Embedded] Deleting {}", blob_id);
        Ok(())
    }

    async fn about(&self) -> Result<()> {
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded vidlink-core Example ===\n");

    // Create configuration
    let store_path = std::env::temp_dir().join("vidlink-embedded-demo.json");
    let config = VidlinkConfig {
        base_url: "https://vid.example".to_string(),
        container_id: "demo-folder".to_string(),
        primary: PrimaryStoreConfig {
            path: store_path.display().to_string(),
        },
        secondary: SecondaryStoreConfig::Memory,
        engine: EngineConfig::default(),
    };
    config.validate()?;

    // Create custom components
    println!("1. Wiring components...");
    let primary = FileStore::open(&config.primary.path).await?;
    let secondary = match config.secondary {
        SecondaryStoreConfig::Memory => {
            SecondaryHandle::with_store(Arc::new(MemoryDocumentStore::new()))
        }
        SecondaryStoreConfig::None => SecondaryHandle::empty(),
    };
    let registry = Arc::new(VideoRegistry::new(primary, secondary));
    let broadcaster = Arc::new(ChangeBroadcaster::with_capacity(
        config.engine.broadcast_capacity,
    ));

    let engine = VideoEngine::new(
        Arc::new(EmbeddedBlobStore::new()),
        Arc::new(StaticCredentials::new("embedded-token")),
        registry.clone(),
        broadcaster,
        &config.base_url,
        &config.container_id,
    );

    // Spawn a live update listener (what a web UI would hold open)
    let mut updates = engine.subscribe().await;
    let listener = tokio::spawn(async move {
        println!("2. Update listener started");
        while let Some(envelope) = updates.recv().await {
            if let Envelope::VideosUpdated { videos } = envelope {
                println!("[Event] registry now holds {} video(s)", videos.len());
            }
        }
        println!("Update listener stopped");
    });

    // Upload a payload
    println!("3. Uploading...");
    let outcome = engine
        .upload(Bytes::from_static(b"not really a video"), "demo.mp4", "video/mp4")
        .await?;
    println!("   link:   {}", outcome.link);
    println!("   number: {}", outcome.number);

    // Resolve it the way a viewer request would
    if let Some(resolved) = engine.resolve(&outcome.number).await {
        println!("4. Resolved #{} -> {}", outcome.number, resolved.drive_id);
    }

    // Delete it again
    println!("5. Deleting...");
    engine.remove(&outcome.number).await?;

    // Let the listener drain, then stop it by dropping the engine
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    drop(engine);
    let _ = tokio::time::timeout(tokio::time::Duration::from_millis(100), listener).await;

    let _ = tokio::fs::remove_file(&store_path).await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Engine lifecycle is fully controlled by application");
    println!("- No global state");
    println!("- All components are custom (not vidlinkd defaults)");

    Ok(())
}
