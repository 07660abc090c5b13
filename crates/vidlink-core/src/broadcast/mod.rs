//! Live-update fan-out
//!
//! The broadcaster keeps a set of open subscriber channels and pushes the
//! current registry snapshot to all of them whenever the registry mutates.
//! Delivery is fire-and-forget, at-most-once per currently-open
//! subscriber: closed channels are pruned, full ones are skipped. No acks,
//! no retry, no per-subscriber queueing beyond the channel capacity.
//!
//! Envelopes are JSON with a `type` discriminator. Only `videos_updated`
//! is produced by this core; `session_update` and `upload_progress` exist
//! for wire compatibility with the transport's other producers.

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, trace};

use crate::record::VideoListing;

/// Default per-subscriber channel capacity
const DEFAULT_SUBSCRIBER_CAPACITY: usize = 16;

/// Wire envelope pushed to live-update subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// The registry changed; carries the full current listing
    VideosUpdated {
        /// Current registry materialization, newest first where known
        videos: Vec<VideoListing>,
    },

    /// Session-level state change (produced by the session layer, not here)
    SessionUpdate {
        /// Whether the blob-store credential is currently usable
        connected: bool,
    },

    /// Upload progress ticks (produced by the upload UI, not here)
    UploadProgress {
        /// Display name of the file being uploaded
        name: String,
        /// Progress percentage, 0-100
        percent: u8,
    },
}

/// Subscriber registry with a single publish operation
pub struct ChangeBroadcaster {
    subscribers: RwLock<Vec<mpsc::Sender<Envelope>>>,
    capacity: usize,
}

impl ChangeBroadcaster {
    /// Create a broadcaster with the default per-subscriber capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SUBSCRIBER_CAPACITY)
    }

    /// Create a broadcaster with an explicit per-subscriber capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Register a new subscriber and return its receiving end.
    ///
    /// The subscription ends when the receiver is dropped; the dead sender
    /// is pruned on the next publish.
    pub async fn subscribe(&self) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.write().await.push(tx);
        rx
    }

    /// Number of currently-registered subscribers (including ones that
    /// have not been pruned yet).
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Push an envelope to every open subscriber.
    ///
    /// Closed subscribers are removed; subscribers whose channel is full
    /// are skipped for this envelope, not queued.
    pub async fn publish(&self, envelope: Envelope) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|tx| !tx.is_closed());

        let mut delivered = 0usize;
        for tx in subscribers.iter() {
            match tx.try_send(envelope.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    trace!("Subscriber channel full, skipping delivery");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Raced a close between retain and send; pruned next time
                }
            }
        }

        debug!(
            "Broadcast delivered to {}/{} subscriber(s)",
            delivered,
            subscribers.len()
        );
    }

    /// Convenience for the one envelope this core produces.
    pub async fn publish_videos_updated(&self, videos: Vec<VideoListing>) {
        self.publish(Envelope::VideosUpdated { videos }).await;
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBroadcaster")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
