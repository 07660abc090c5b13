// # Secondary Store Handle
//
// Owns the secondary store's connection lifecycle.
//
// ## Purpose
//
// The registry facade never talks to a global connection; it holds this
// handle, which starts empty and is filled by a fixed-delay connect loop.
// `ready()` is the readiness check: `None` means the facade operates in
// primary-only mode for that call.
//
// There is no reconnect-on-failure once a connection is installed;
// per-call errors are absorbed by the facade's fallback policy.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::traits::document_store::{DocumentStore, DocumentStoreConnector};

/// Injectable handle to the (possibly absent) secondary store
#[derive(Default)]
pub struct SecondaryHandle {
    inner: RwLock<Option<Arc<dyn DocumentStore>>>,
}

impl SecondaryHandle {
    /// A handle with no connection; the registry runs primary-only until
    /// [`SecondaryHandle::install`] is called.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A handle that is connected from the start (tests, embedded use).
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Some(store)),
        })
    }

    /// The current connection, if any.
    pub async fn ready(&self) -> Option<Arc<dyn DocumentStore>> {
        self.inner.read().await.clone()
    }

    /// Install a connected store into the handle.
    pub async fn install(&self, store: Arc<dyn DocumentStore>) {
        *self.inner.write().await = Some(store);
    }

    /// Retry `connector` at a fixed delay until it succeeds, then install
    /// the result. Runs until connected; callers spawn this as a
    /// background task.
    pub async fn connect_loop(
        self: Arc<Self>,
        connector: Arc<dyn DocumentStoreConnector>,
        retry_delay: Duration,
    ) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match connector.connect().await {
                Ok(store) => {
                    self.install(store).await;
                    info!("Secondary store connected after {} attempt(s)", attempt);
                    return;
                }
                Err(e) => {
                    warn!(
                        "Secondary store connection attempt {} failed: {}. Retrying in {:?}.",
                        attempt, e, retry_delay
                    );
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for SecondaryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryHandle").finish_non_exhaustive()
    }
}
