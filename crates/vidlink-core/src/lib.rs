// # vidlink-core
//
// Core library for the dual-store video registry.
//
// ## Architecture Overview
//
// This library keeps a registry of uploaded videos (short public numbers
// mapped to opaque blob-store identifiers) across two persistence tiers,
// and fans registry snapshots out to live subscribers:
//
// - **FileStore**: the durable flat-file primary tier (always available)
// - **DocumentStore**: trait for the optional richer secondary tier
// - **VideoRegistry**: facade defining precedence and merge policy between
//   the tiers (union reads, secondary wins, best-effort dual writes)
// - **ChangeBroadcaster**: fire-and-forget snapshot fan-out to open
//   subscriber channels
// - **VideoEngine**: drives the external blob store and the registry
//   together for upload/delete, and owns the credential refresh policy
//
// ## Design Principles
//
// 1. **Two-tier cache, not a transaction**: the secondary store is a
//    fast/rich tier, the flat file the durable fallback; atomicity across
//    tiers is never pretended
// 2. **Collaborators behind traits**: blob store, credentials and the
//    secondary store are injected, never ambient
// 3. **Storage failures stay inside the facade**: reads and writes degrade,
//    they do not propagate
// 4. **Library-first**: the daemon is a thin shell over this crate

pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use broadcast::{ChangeBroadcaster, Envelope};
pub use config::{EngineConfig, PrimaryStoreConfig, SecondaryStoreConfig, VidlinkConfig};
pub use engine::{Resolved, UploadOutcome, VideoEngine};
pub use error::{Error, Result};
pub use record::{Resolution, VideoListing, VideoRecord};
pub use registry::VideoRegistry;
pub use store::{FileStore, MemoryDocumentStore, SecondaryHandle};
pub use traits::{BlobStore, CredentialProvider, DocumentStore, DocumentStoreConnector};
