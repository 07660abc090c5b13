// # File Store (primary tier)
//
// Flat-file implementation of the always-available persistence tier.
//
// ## Purpose
//
// A single JSON document mapping public numbers to records, created empty
// on first run. This tier is the durable last resort: it must stay
// readable by the legacy format (`{ "4217": { "driveId": ..., "name":
// ... } }`) and keep working when the secondary store never comes up.
//
// ## Failure policy
//
// - Corrupt JSON is treated as an empty store for reads; the next
//   successful write replaces the file with a minimal valid document. This
//   is a documented silent-data-loss risk, logged loudly when it happens.
// - Writes are whole-file: serialize the in-memory map, write a temporary
//   file, rename over the target. There is no advisory locking; concurrent
//   writers are last-writer-wins by design.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::Error;
use crate::record::VideoRecord;

/// File-backed primary store
///
/// Records are kept in memory behind an `RwLock` and flushed to disk on
/// every mutation with a write-then-rename for atomicity.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Arc<RwLock<BTreeMap<String, VideoRecord>>>,
}

impl FileStore {
    /// Open or create the store at `path`.
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing file, treating corrupt content as empty
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let records = Self::load(&path).await;

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Load the file, degrading to an empty map on absence or corruption.
    async fn load(path: &Path) -> BTreeMap<String, VideoRecord> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return BTreeMap::new();
        }

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "Failed to read store file {}: {}. Treating as empty.",
                    path.display(),
                    e
                );
                return BTreeMap::new();
            }
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(
                    "Store file {} is corrupt: {}. Treating as empty; the next \
                     write will replace it.",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    /// Write the current map to disk atomically.
    async fn write(&self) -> Result<(), Error> {
        let records = self.records.read().await;

        let json = serde_json::to_string_pretty(&*records)
            .map_err(|e| Error::primary_store(format!("Failed to serialize store: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::primary_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::primary_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::primary_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::primary_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Store written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// A copy of the full number→record map.
    pub async fn snapshot(&self) -> BTreeMap<String, VideoRecord> {
        self.records.read().await.clone()
    }

    /// Look up a record by its public number.
    pub async fn get(&self, number: &str) -> Option<VideoRecord> {
        self.records.read().await.get(number).cloned()
    }

    /// Resolve an identifier: direct number match first, then a linear scan
    /// over blob identifiers.
    pub async fn find(&self, identifier: &str) -> Option<(String, VideoRecord)> {
        let records = self.records.read().await;
        if let Some(record) = records.get(identifier) {
            return Some((identifier.to_string(), record.clone()));
        }
        records
            .iter()
            .find(|(_, record)| record.drive_id == identifier)
            .map(|(number, record)| (number.clone(), record.clone()))
    }

    /// Insert or replace the record under `number` and flush to disk.
    pub async fn upsert(&self, number: &str, record: &VideoRecord) -> Result<(), Error> {
        {
            let mut records = self.records.write().await;
            records.insert(number.to_string(), record.clone());
        }
        self.write().await
    }

    /// Remove a record by number or blob identifier and flush to disk.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: a record was removed
    /// - `Ok(false)`: nothing matched (no write issued)
    pub async fn remove(&self, identifier: &str) -> Result<bool, Error> {
        let removed = {
            let mut records = self.records.write().await;
            let key = if records.contains_key(identifier) {
                Some(identifier.to_string())
            } else {
                records
                    .iter()
                    .find(|(_, record)| record.drive_id == identifier)
                    .map(|(number, _)| number.clone())
            };
            match key {
                Some(key) => records.remove(&key).is_some(),
                None => false,
            }
        };

        if removed {
            self.write().await?;
        }
        Ok(removed)
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn file_store_basic_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);

        let record = VideoRecord::new("abc", "x.mp4", None);
        store.upsert("42", &record).await.unwrap();
        assert!(path.exists());

        // Reload from disk
        let store2 = FileStore::open(&path).await.unwrap();
        let loaded = store2.get("42").await.unwrap();
        assert_eq!(loaded.drive_id, "abc");
        assert_eq!(loaded.name, "x.mp4");
    }

    #[tokio::test]
    async fn legacy_file_format_is_readable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        fs::write(&path, br#"{"42": {"driveId": "abc", "name": "x.mp4"}}"#)
            .await
            .unwrap();

        let store = FileStore::open(&path).await.unwrap();
        let (number, record) = store.find("42").await.unwrap();
        assert_eq!(number, "42");
        assert_eq!(record.drive_id, "abc");

        // Fallback scan by blob identifier
        let (number, record) = store.find("abc").await.unwrap();
        assert_eq!(number, "42");
        assert_eq!(record.drive_id, "abc");
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        fs::write(&path, b"not json at all").await.unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.is_empty().await);

        // Next write replaces the corrupt file with a valid document
        store
            .upsert("7", &VideoRecord::new("xyz", "y.mp4", None))
            .await
            .unwrap();
        let content = fs::read_to_string(&path).await.unwrap();
        let parsed: BTreeMap<String, VideoRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn remove_by_number_and_by_drive_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("videos.json");
        let store = FileStore::open(&path).await.unwrap();

        store
            .upsert("1", &VideoRecord::new("aaaa", "a.mp4", None))
            .await
            .unwrap();
        store
            .upsert("2", &VideoRecord::new("bbbb", "b.mp4", None))
            .await
            .unwrap();

        assert!(store.remove("1").await.unwrap());
        assert!(store.remove("bbbb").await.unwrap());
        assert!(!store.remove("1").await.unwrap());
        assert!(store.is_empty().await);
    }
}
