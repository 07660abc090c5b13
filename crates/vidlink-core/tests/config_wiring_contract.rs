//! Contract Test: Configuration-Driven Wiring
//!
//! Verifies that a validated `VidlinkConfig` is sufficient to wire every
//! component (primary store path, secondary store selection, broadcast
//! capacity, link base URL) without reaching for values from anywhere
//! else.

mod common;

use common::*;
use std::sync::Arc;
use vidlink_core::config::{
    EngineConfig, PrimaryStoreConfig, SecondaryStoreConfig, VidlinkConfig,
};
use vidlink_core::store::{FileStore, MemoryDocumentStore, SecondaryHandle};
use vidlink_core::{ChangeBroadcaster, VideoEngine, VideoRegistry};

fn config_for(dir: &tempfile::TempDir, secondary: SecondaryStoreConfig) -> VidlinkConfig {
    VidlinkConfig {
        base_url: TEST_BASE_URL.to_string(),
        container_id: "test-container".to_string(),
        primary: PrimaryStoreConfig {
            path: dir.path().join("videos.json").display().to_string(),
        },
        secondary,
        engine: EngineConfig::default(),
    }
}

/// Build the full component stack from a config, the way the daemon does.
async fn engine_from(config: &VidlinkConfig) -> VideoEngine {
    let primary = FileStore::open(&config.primary.path).await.expect("store opens");
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
    VideoEngine::new(
        MockBlobStore::new(),
        MockCredentials::connected(),
        registry,
        broadcaster,
        &config.base_url,
        &config.container_id,
    )
}

#[tokio::test]
async fn validated_config_wires_a_working_stack() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(&dir, SecondaryStoreConfig::Memory);
    config.validate().expect("config is valid");

    let engine = engine_from(&config).await;
    let outcome = engine.upload(payload(), "clip.mp4", "video/mp4").await.unwrap();

    // The link base and the store location both came from the config
    assert!(outcome.link.starts_with(&config.base_url));
    assert!(std::path::Path::new(&config.primary.path).exists());
}

#[tokio::test]
async fn primary_only_selection_comes_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(&dir, SecondaryStoreConfig::None);
    config.validate().expect("config is valid");

    let engine = engine_from(&config).await;
    let outcome = engine.upload(payload(), "clip.mp4", "video/mp4").await.unwrap();

    // Resolvable purely from the flat file
    assert!(engine.resolve(&outcome.number).await.is_some());
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_wiring() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config_for(&dir, SecondaryStoreConfig::None);
    config.base_url = "not-a-url".to_string();

    assert!(config.validate().is_err());
}
