// # Document Store Trait
//
// Defines the interface for the optional secondary persistence tier.
//
// ## Purpose
//
// The secondary store is the "rich" tier: same logical schema as the flat
// file plus creation timestamps and view counts, keyed by the unique public
// number and secondarily indexed by the blob identifier. It is preferred
// for reads when reachable; the registry facade falls back to the primary
// flat file on any error here and never surfaces the failure.
//
// ## Implementations
//
// - In-memory: [`crate::store::MemoryDocumentStore`]

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::record::VideoRecord;

/// Trait for secondary store implementations
///
/// All lookups taking an `identifier` match on the public number OR the
/// blob identifier (the `$or` query of the original schema).
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All records, sorted by creation time descending.
    async fn list(&self) -> Result<Vec<(String, VideoRecord)>>;

    /// Find one record by number or blob identifier.
    async fn find(&self, identifier: &str) -> Result<Option<(String, VideoRecord)>>;

    /// Upsert a record keyed by its public number.
    ///
    /// Fields not present on the incoming record (creation timestamp, a
    /// zero view count) are defaulted on first insert only; an update never
    /// overwrites them.
    async fn upsert(&self, number: &str, record: &VideoRecord) -> Result<()>;

    /// Remove a record by number or blob identifier.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: a record was removed
    /// - `Ok(false)`: nothing matched
    async fn remove(&self, identifier: &str) -> Result<bool>;

    /// Increment the view counter of a record matched by number or blob
    /// identifier. A miss is not an error.
    async fn increment_views(&self, identifier: &str) -> Result<()>;
}

/// Connector used by the startup retry loop to establish the secondary
/// store connection.
#[async_trait]
pub trait DocumentStoreConnector: Send + Sync {
    /// Attempt to connect once.
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>>;
}
