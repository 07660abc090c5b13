//! Configuration types for the vidlink system
//!
//! This module defines all configuration structures used throughout the
//! crate.

use serde::{Deserialize, Serialize};

/// Main vidlink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VidlinkConfig {
    /// Base URL embedded in public viewer links
    pub base_url: String,

    /// Blob-store container (folder) uploads are created under
    pub container_id: String,

    /// Primary flat-file store settings
    pub primary: PrimaryStoreConfig,

    /// Secondary store selection
    #[serde(default)]
    pub secondary: SecondaryStoreConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl VidlinkConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_url.is_empty() {
            return Err(crate::Error::config("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "base_url must be an http(s) URL, got: {}",
                self.base_url
            )));
        }
        if self.container_id.is_empty() {
            return Err(crate::Error::config("container_id cannot be empty"));
        }
        if self.primary.path.is_empty() {
            return Err(crate::Error::config("primary store path cannot be empty"));
        }
        Ok(())
    }
}

/// Primary flat-file store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryStoreConfig {
    /// Path to the JSON store file; created empty on first run
    pub path: String,
}

/// Secondary store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecondaryStoreConfig {
    /// No secondary store; the registry runs primary-only
    #[default]
    None,

    /// In-memory secondary store (not persistent)
    Memory,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between secondary store connection attempts (in seconds)
    #[serde(default = "default_connect_retry_secs")]
    pub connect_retry_secs: u64,

    /// Per-subscriber broadcast channel capacity
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_retry_secs: default_connect_retry_secs(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

fn default_connect_retry_secs() -> u64 {
    5
}

fn default_broadcast_capacity() -> usize {
    16
}
