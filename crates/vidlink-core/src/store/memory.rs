// # Memory Document Store (secondary tier)
//
// In-memory implementation of DocumentStore.
//
// ## Purpose
//
// Provides the richer secondary tier (creation timestamps, view counts)
// without external infrastructure. State is lost on restart, which is the
// accepted behavior for this tier: the flat file remains the durable
// fallback and the facade reconciles the two on read.
//
// ## When to Use
//
// - Testing environments
// - Single-process deployments where the flat file alone is durable enough

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Error;
use crate::record::VideoRecord;
use crate::traits::document_store::{DocumentStore, DocumentStoreConnector};

/// In-memory secondary store implementation
///
/// Records live in a HashMap behind an RwLock, keyed by public number.
/// Lookups by blob identifier are linear scans, mirroring the secondary
/// index of the document-database schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    records: Arc<RwLock<HashMap<String, VideoRecord>>>,
}

impl MemoryDocumentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the store
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop all records
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self) -> Result<Vec<(String, VideoRecord)>, Error> {
        let records = self.records.read().await;
        let mut entries: Vec<(String, VideoRecord)> = records
            .iter()
            .map(|(number, record)| (number.clone(), record.clone()))
            .collect();
        // Newest first; records without a timestamp sort last
        entries.sort_by(|(_, a), (_, b)| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn find(&self, identifier: &str) -> Result<Option<(String, VideoRecord)>, Error> {
        let records = self.records.read().await;
        if let Some(record) = records.get(identifier) {
            return Ok(Some((identifier.to_string(), record.clone())));
        }
        Ok(records
            .iter()
            .find(|(_, record)| record.drive_id == identifier)
            .map(|(number, record)| (number.clone(), record.clone())))
    }

    async fn upsert(&self, number: &str, record: &VideoRecord) -> Result<(), Error> {
        let mut records = self.records.write().await;
        match records.get_mut(number) {
            Some(existing) => {
                // Update path: identity fields move, insert-time defaults stay
                existing.drive_id = record.drive_id.clone();
                existing.name = record.name.clone();
                if record.size.is_some() {
                    existing.size = record.size;
                }
            }
            None => {
                let mut fresh = record.clone();
                if fresh.created_at.is_none() {
                    fresh.created_at = Some(chrono::Utc::now());
                }
                if fresh.views.is_none() {
                    fresh.views = Some(0);
                }
                records.insert(number.to_string(), fresh);
            }
        }
        Ok(())
    }

    async fn remove(&self, identifier: &str) -> Result<bool, Error> {
        let mut records = self.records.write().await;
        let key = if records.contains_key(identifier) {
            Some(identifier.to_string())
        } else {
            records
                .iter()
                .find(|(_, record)| record.drive_id == identifier)
                .map(|(number, _)| number.clone())
        };
        Ok(match key {
            Some(key) => records.remove(&key).is_some(),
            None => false,
        })
    }

    async fn increment_views(&self, identifier: &str) -> Result<(), Error> {
        let mut records = self.records.write().await;
        let key = if records.contains_key(identifier) {
            Some(identifier.to_string())
        } else {
            records
                .iter()
                .find(|(_, record)| record.drive_id == identifier)
                .map(|(number, _)| number.clone())
        };
        if let Some(key) = key {
            if let Some(record) = records.get_mut(&key) {
                record.views = Some(record.views.unwrap_or(0) + 1);
            }
        }
        Ok(())
    }
}

/// Connector yielding a fresh in-memory store.
///
/// Connecting always succeeds; exists so the daemon can treat the memory
/// backend uniformly with real document databases.
#[derive(Debug, Default)]
pub struct MemoryConnector;

#[async_trait]
impl DocumentStoreConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, Error> {
        Ok(Arc::new(MemoryDocumentStore::new()))
    }
}
