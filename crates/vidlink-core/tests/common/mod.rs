//! Test doubles and common utilities for contract tests
//!
//! Minimal collaborator doubles with call counters, used to verify the
//! engine/registry contracts without real external services.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vidlink_core::error::{Error, Result};
use vidlink_core::record::VideoRecord;
use vidlink_core::store::{FileStore, MemoryDocumentStore, SecondaryHandle};
use vidlink_core::traits::{BlobStore, CredentialProvider, DocumentStore};
use vidlink_core::{ChangeBroadcaster, VideoEngine, VideoRegistry};

/// Base URL used by all test engines
pub const TEST_BASE_URL: &str = "https://vid.example";

/// A blob store that succeeds and hands out sequential fake identifiers
pub struct MockBlobStore {
    create_calls: AtomicUsize,
    permission_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    next_id: AtomicUsize,
    /// When set, every call fails with this error kind
    fail_mode: std::sync::Mutex<Option<FailMode>>,
    /// When set, fail exactly once then clear (refresh-retry testing)
    fail_once: AtomicBool,
    deleted: std::sync::Mutex<Vec<String>>,
}

/// How a failing mock should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    AuthExpired,
    Transient,
    NotFound,
}

impl FailMode {
    fn to_error(self) -> Error {
        match self {
            FailMode::AuthExpired => Error::auth_expired("invalid_grant"),
            FailMode::Transient => Error::blob_store("upstream 503"),
            FailMode::NotFound => Error::not_found("no such blob"),
        }
    }
}

impl MockBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            create_calls: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
            fail_mode: std::sync::Mutex::new(None),
            fail_once: AtomicBool::new(false),
            deleted: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn failing(mode: FailMode) -> Arc<Self> {
        let store = Self::new();
        *store.fail_mode.lock().unwrap() = Some(mode);
        store
    }

    /// Fail the next call with `mode`, then behave normally.
    pub fn fail_next(self: &Arc<Self>, mode: FailMode) {
        *self.fail_mode.lock().unwrap() = Some(mode);
        self.fail_once.store(true, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn check_fail(&self) -> Result<()> {
        let mut mode = self.fail_mode.lock().unwrap();
        if let Some(m) = *mode {
            if self.fail_once.swap(false, Ordering::SeqCst) {
                *mode = None;
            }
            return Err(m.to_error());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn create(
        &self,
        _bytes: Bytes,
        _name: &str,
        _mime_type: &str,
        _container_id: &str,
    ) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        // Shaped like a real opaque id: 28+ URL-safe base64 chars
        Ok(format!("blob{:0>28}", n))
    }

    async fn set_public_read(&self, _blob_id: &str) -> Result<()> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_fail()?;
        self.deleted.lock().unwrap().push(blob_id.to_string());
        Ok(())
    }

    async fn about(&self) -> Result<()> {
        self.check_fail()
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Credential provider with controllable expiry and a refresh counter
pub struct MockCredentials {
    connected: AtomicBool,
    expiring: AtomicBool,
    refresh_calls: AtomicUsize,
}

impl MockCredentials {
    pub fn connected() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(true),
            expiring: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
        })
    }

    pub fn disconnected() -> Arc<Self> {
        let creds = Self::connected();
        creds.connected.store(false, Ordering::SeqCst);
        creds
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn set_expiring(&self, expiring: bool) {
        self.expiring.store(expiring, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialProvider for MockCredentials {
    async fn bearer(&self) -> Result<String> {
        if self.connected.load(Ordering::SeqCst) {
            Ok("test-bearer".to_string())
        } else {
            Err(Error::auth_expired("not connected"))
        }
    }

    async fn is_expiring(&self) -> bool {
        self.expiring.load(Ordering::SeqCst)
    }

    async fn refresh(&self) -> Result<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.connected.load(Ordering::SeqCst) {
            self.expiring.store(false, Ordering::SeqCst);
            Ok(())
        } else {
            Err(Error::auth_expired("no grant to refresh"))
        }
    }
}

/// A document store whose every operation errors (unreachable secondary)
pub struct BrokenDocumentStore;

#[async_trait]
impl DocumentStore for BrokenDocumentStore {
    async fn list(&self) -> Result<Vec<(String, VideoRecord)>> {
        Err(Error::secondary_store("connection reset"))
    }

    async fn find(&self, _identifier: &str) -> Result<Option<(String, VideoRecord)>> {
        Err(Error::secondary_store("connection reset"))
    }

    async fn upsert(&self, _number: &str, _record: &VideoRecord) -> Result<()> {
        Err(Error::secondary_store("connection reset"))
    }

    async fn remove(&self, _identifier: &str) -> Result<bool> {
        Err(Error::secondary_store("connection reset"))
    }

    async fn increment_views(&self, _identifier: &str) -> Result<()> {
        Err(Error::secondary_store("connection reset"))
    }
}

/// Everything a contract test needs, wired together
pub struct Harness {
    pub engine: VideoEngine,
    pub registry: Arc<VideoRegistry>,
    pub broadcaster: Arc<ChangeBroadcaster>,
    pub blob_store: Arc<MockBlobStore>,
    pub credentials: Arc<MockCredentials>,
    pub secondary: Option<Arc<MemoryDocumentStore>>,
    _dir: tempfile::TempDir,
}

/// Which secondary tier a harness should run with
pub enum SecondaryMode {
    None,
    Memory,
    Broken,
}

pub async fn harness(mode: SecondaryMode) -> Harness {
    harness_with(mode, MockBlobStore::new(), MockCredentials::connected()).await
}

pub async fn harness_with(
    mode: SecondaryMode,
    blob_store: Arc<MockBlobStore>,
    credentials: Arc<MockCredentials>,
) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let primary = FileStore::open(dir.path().join("videos.json"))
        .await
        .expect("file store opens");

    let (handle, secondary) = match mode {
        SecondaryMode::None => (SecondaryHandle::empty(), None),
        SecondaryMode::Memory => {
            let store = Arc::new(MemoryDocumentStore::new());
            (SecondaryHandle::with_store(store.clone()), Some(store))
        }
        SecondaryMode::Broken => (
            SecondaryHandle::with_store(Arc::new(BrokenDocumentStore)),
            None,
        ),
    };

    let registry = Arc::new(VideoRegistry::new(primary, handle));
    let broadcaster = Arc::new(ChangeBroadcaster::new());
    let engine = VideoEngine::new(
        blob_store.clone(),
        credentials.clone(),
        registry.clone(),
        broadcaster.clone(),
        TEST_BASE_URL,
        "test-container",
    );

    Harness {
        engine,
        registry,
        broadcaster,
        blob_store,
        credentials,
        secondary,
        _dir: dir,
    }
}

/// One-kilobyte payload for upload tests
pub fn payload() -> Bytes {
    Bytes::from(vec![0u8; 1024])
}
