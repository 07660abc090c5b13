//! Registry facade over the two persistence tiers
//!
//! The registry unifies the flat-file primary store and the optional
//! secondary document store behind one interface with a defined precedence
//! and merge policy:
//!
//! - A record is visible if it exists in EITHER tier.
//! - The secondary copy wins on conflict for reads; fields it never stores
//!   are backfilled from the primary copy.
//! - Writes go to both tiers independently. A failure in one tier never
//!   prevents the other from being attempted, and neither failure is
//!   surfaced: callers must assume the write reached at least the tiers
//!   that were reachable. There is no atomicity across tiers and none is
//!   pretended.
//!
//! ## Concurrency
//!
//! Single-process, cooperative. Two concurrent `add` calls can both pass
//! the uniqueness check in [`VideoRegistry::generate_number`] before either
//! write lands, assigning the same number twice. This is an accepted
//! weakness, not an invariant.

use std::collections::BTreeMap;
use std::sync::Arc;
use rand::Rng;
use tracing::{debug, warn};

use crate::record::{self, Resolution, VideoListing, VideoRecord};
use crate::store::{FileStore, SecondaryHandle};

/// Inclusive bounds for generated public numbers.
///
/// 9000 live records is the scale ceiling; beyond that, generation
/// degrades into frequent retries.
const NUMBER_MIN: u32 = 1000;
const NUMBER_MAX: u32 = 9999;

/// Facade over the primary file store and the secondary store handle
pub struct VideoRegistry {
    primary: FileStore,
    secondary: Arc<SecondaryHandle>,
}

impl VideoRegistry {
    /// Build a registry from its two tiers.
    pub fn new(primary: FileStore, secondary: Arc<SecondaryHandle>) -> Self {
        Self { primary, secondary }
    }

    /// Best-effort union of both tiers, keyed by public number.
    ///
    /// Secondary-tier errors are logged and degrade to an empty secondary
    /// result; this never fails for storage reasons. When both tiers are
    /// unreadable the result is an empty map.
    pub async fn get_all(&self) -> BTreeMap<String, VideoRecord> {
        let mut merged: BTreeMap<String, VideoRecord> = BTreeMap::new();

        if let Some(store) = self.secondary.ready().await {
            match store.list().await {
                Ok(entries) => {
                    for (number, record) in entries {
                        merged.insert(number, record);
                    }
                }
                Err(e) => {
                    warn!("Secondary store list failed, continuing without it: {}", e);
                }
            }
        }

        for (number, primary_record) in self.primary.snapshot().await {
            match merged.remove(&number) {
                Some(secondary_record) => {
                    // Secondary wins; absent fields come from the primary copy
                    merged.insert(number, secondary_record.backfill_from(&primary_record));
                }
                None => {
                    merged.insert(number, primary_record);
                }
            }
        }

        merged
    }

    /// Upsert a record into both tiers, best-effort.
    pub async fn add(&self, number: &str, record: &VideoRecord) {
        if let Some(store) = self.secondary.ready().await {
            if let Err(e) = store.upsert(number, record).await {
                warn!("Secondary store upsert for {} failed: {}", number, e);
            }
        }

        if let Err(e) = self.primary.upsert(number, record).await {
            warn!("Primary store upsert for {} failed: {}", number, e);
        }
    }

    /// Remove a record from both tiers, best-effort. The identifier may be
    /// the public number or the blob identifier.
    ///
    /// Returns whether any tier actually dropped a record, so callers can
    /// distinguish a repeated delete from a first one.
    pub async fn delete(&self, identifier: &str) -> bool {
        let mut removed = false;

        if let Some(store) = self.secondary.ready().await {
            match store.remove(identifier).await {
                Ok(dropped) => removed |= dropped,
                Err(e) => warn!("Secondary store delete of {} failed: {}", identifier, e),
            }
        }

        match self.primary.remove(identifier).await {
            Ok(dropped) => removed |= dropped,
            Err(e) => warn!("Primary store delete of {} failed: {}", identifier, e),
        }

        removed
    }

    /// Bump the view counter in the secondary tier. Silent no-op when the
    /// secondary store is unavailable; the primary tier is never touched.
    pub async fn increment_views(&self, identifier: &str) {
        if let Some(store) = self.secondary.ready().await {
            if let Err(e) = store.increment_views(identifier).await {
                debug!("View increment for {} failed: {}", identifier, e);
            }
        }
    }

    /// Resolve an identifier to a record.
    ///
    /// Policy, in order:
    /// 1. Identifiers shaped like a raw blob id (>=28 URL-safe base64
    ///    chars) are returned as direct references without consulting
    ///    either tier, so old links that embedded the blob id keep working.
    /// 2. Secondary lookup by number or blob id.
    /// 3. Primary lookup by number, then a linear scan by blob id.
    ///
    /// Never fails for storage reasons; `None` is the not-found signal.
    pub async fn find_by_identifier(&self, identifier: &str) -> Option<Resolution> {
        if record::is_direct_reference(identifier) {
            debug!("Identifier {} treated as direct blob reference", identifier);
            return Some(Resolution::Direct {
                drive_id: identifier.to_string(),
            });
        }

        if let Some(store) = self.secondary.ready().await {
            match store.find(identifier).await {
                Ok(Some((number, record))) => {
                    return Some(Resolution::Stored { number, record });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "Secondary store lookup of {} failed, falling back: {}",
                        identifier, e
                    );
                }
            }
        }

        self.primary
            .find(identifier)
            .await
            .map(|(number, record)| Resolution::Stored { number, record })
    }

    /// Materialize the registry for listing and broadcast.
    ///
    /// Ordering: the secondary tier's creation-time-descending list when it
    /// is reachable and non-empty, otherwise the primary file's own order.
    pub async fn list(&self, base_url: &str) -> Vec<VideoListing> {
        if let Some(store) = self.secondary.ready().await {
            match store.list().await {
                Ok(entries) if !entries.is_empty() => {
                    return entries
                        .iter()
                        .map(|(number, record)| {
                            VideoListing::from_record(number, record, base_url)
                        })
                        .collect();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Secondary store list failed, using primary order: {}", e);
                }
            }
        }

        self.primary
            .snapshot()
            .await
            .iter()
            .map(|(number, record)| VideoListing::from_record(number, record, base_url))
            .collect()
    }

    /// Draw a public number not present in either tier's keyspace.
    ///
    /// Rejection sampling over [1000, 9999]. The check and the eventual
    /// write are not atomic; concurrent callers can both be handed the
    /// same number (see module docs).
    pub async fn generate_number(&self) -> String {
        let taken = self.get_all().await;
        loop {
            let candidate = rand::thread_rng()
                .gen_range(NUMBER_MIN..=NUMBER_MAX)
                .to_string();
            if !taken.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Direct access to the primary tier (daemon shutdown, tests).
    pub fn primary(&self) -> &FileStore {
        &self.primary
    }

    /// The secondary store handle this registry reads through.
    pub fn secondary(&self) -> &Arc<SecondaryHandle> {
        &self.secondary
    }
}

impl std::fmt::Debug for VideoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRegistry")
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use crate::traits::DocumentStore;
    use tempfile::tempdir;

    async fn registry_with_secondary() -> (VideoRegistry, Arc<MemoryDocumentStore>, tempfile::TempDir)
    {
        let dir = tempdir().unwrap();
        let primary = FileStore::open(dir.path().join("videos.json")).await.unwrap();
        let secondary = Arc::new(MemoryDocumentStore::new());
        let handle = SecondaryHandle::with_store(secondary.clone());
        (VideoRegistry::new(primary, handle), secondary, dir)
    }

    #[tokio::test]
    async fn get_all_unions_and_prefers_secondary() {
        let (registry, secondary, _dir) = registry_with_secondary().await;

        // Only in primary
        registry
            .primary()
            .upsert("1", &VideoRecord::new("aaaa", "primary-only.mp4", None))
            .await
            .unwrap();

        // In both, with diverged names: secondary must win
        registry
            .primary()
            .upsert("2", &VideoRecord::new("bbbb", "old-name.mp4", Some(512)))
            .await
            .unwrap();
        secondary
            .upsert("2", &VideoRecord::new("bbbb", "new-name.mp4", None))
            .await
            .unwrap();

        // Only in secondary
        secondary
            .upsert("3", &VideoRecord::new("cccc", "secondary-only.mp4", None))
            .await
            .unwrap();

        let all = registry.get_all().await;
        assert_eq!(all.len(), 3);
        assert_eq!(all["1"].name, "primary-only.mp4");
        assert_eq!(all["2"].name, "new-name.mp4");
        // Backfill: size only known to the primary copy
        assert_eq!(all["2"].size, Some(512));
        assert_eq!(all["3"].name, "secondary-only.mp4");
    }

    #[tokio::test]
    async fn generate_number_avoids_both_keyspaces() {
        let (registry, secondary, _dir) = registry_with_secondary().await;

        // Occupy most of the range in the secondary tier only; generation
        // must still avoid those keys.
        for n in NUMBER_MIN..NUMBER_MAX {
            secondary
                .upsert(&n.to_string(), &VideoRecord::new(format!("id{}", n), "v", None))
                .await
                .unwrap();
        }

        let number = registry.generate_number().await;
        assert_eq!(number, NUMBER_MAX.to_string());
    }

    #[tokio::test]
    async fn list_falls_back_to_primary_order() {
        let (registry, _secondary, _dir) = registry_with_secondary().await;

        registry
            .primary()
            .upsert("9", &VideoRecord::new("aaaa", "a.mp4", None))
            .await
            .unwrap();
        registry
            .primary()
            .upsert("3", &VideoRecord::new("bbbb", "b.mp4", None))
            .await
            .unwrap();

        // Secondary is connected but empty: primary (key-ordered) wins
        let listed = registry.list("https://vid.example").await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].number, "3");
        assert_eq!(listed[1].number, "9");
    }
}
