//! Event Broadcaster
//!
//! Fans published domain events out to every live subscriber registered under
//! a subscription key. Each subscriber owns a bounded queue; a subscriber whose
//! queue is full at publish time is treated as dead and dropped instead of
//! slowing the publisher down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::frame::event_frame;
use crate::events::CancelToken;

/// Default number of frames a subscriber may have pending.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

type SubscriberId = u64;

/// Builds the key a subscription is indexed under: the bare event type, or
/// `eventType:entityId` when an entity id greater than zero is given.
pub fn subscription_key(event_type: &str, entity_id: Option<u64>) -> String {
    match entity_id.filter(|id| *id > 0) {
        Some(id) => format!("{event_type}:{id}"),
        None => event_type.to_string(),
    }
}

/// One registered delivery channel.
///
/// Dropping the slot closes the subscriber's channel and, through
/// `_removed`, wakes its watcher.
struct SubscriberSlot {
    tx: mpsc::Sender<Bytes>,
    _removed: oneshot::Sender<()>,
}

type SubscriberSets = HashMap<String, HashMap<SubscriberId, SubscriberSlot>>;

struct BroadcasterInner {
    subscribers: RwLock<SubscriberSets>,
    next_id: AtomicU64,
    capacity: usize,
    watchers: AtomicUsize,
}

impl BroadcasterInner {
    /// Removes one subscriber, dropping its key when the set empties.
    fn remove_locked(subscribers: &mut SubscriberSets, key: &str, id: SubscriberId) -> bool {
        let Some(set) = subscribers.get_mut(key) else {
            return false;
        };
        let removed = set.remove(&id).is_some();
        if set.is_empty() {
            subscribers.remove(key);
        }
        removed
    }

    async fn remove(&self, key: &str, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        Self::remove_locked(&mut subscribers, key, id)
    }
}

/// Decrements the live watcher count when a watcher task ends, however it ends.
struct WatcherGuard(Arc<BroadcasterInner>);

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        self.0.watchers.fetch_sub(1, Ordering::AcqRel);
    }
}

// == Event Broadcaster ==
/// Concurrent fan-out of published events to live subscribers.
///
/// Cloning is cheap; all clones share the same subscriber sets.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<BroadcasterInner>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a broadcaster whose subscriber queues hold `capacity` frames.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
                watchers: AtomicUsize::new(0),
            }),
        }
    }

    // == Subscribe ==
    /// Registers a new subscriber and returns its receiving end.
    ///
    /// The subscription stays active until `cancel` fires, the receiver is
    /// dropped, or it is dropped as a slow consumer. In every case the channel
    /// is removed from its set and closed exactly once; frames already queued
    /// are still delivered before the receiver yields `None`.
    ///
    /// # Arguments
    /// * `cancel` - Token whose cancellation ends the subscription
    /// * `event_type` - Event type to receive
    /// * `entity_id` - Restricts the stream to one entity when greater than zero
    pub async fn subscribe(
        &self,
        cancel: &CancelToken,
        event_type: &str,
        entity_id: Option<u64>,
    ) -> mpsc::Receiver<Bytes> {
        let key = subscription_key(event_type, entity_id);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let (removed_tx, removed_rx) = oneshot::channel();
        let watch_tx = tx.clone();

        {
            let mut subscribers = self.inner.subscribers.write().await;
            subscribers.entry(key.clone()).or_default().insert(
                id,
                SubscriberSlot {
                    tx,
                    _removed: removed_tx,
                },
            );
        }
        debug!(key = %key, subscriber = id, "Subscription created");

        self.spawn_watcher(cancel.clone(), key, id, watch_tx, removed_rx);
        rx
    }

    /// Watches one subscription and tears it down when it ends.
    fn spawn_watcher(
        &self,
        cancel: CancelToken,
        key: String,
        id: SubscriberId,
        watch_tx: mpsc::Sender<Bytes>,
        mut removed_rx: oneshot::Receiver<()>,
    ) {
        self.inner.watchers.fetch_add(1, Ordering::AcqRel);
        let guard = WatcherGuard(Arc::clone(&self.inner));

        tokio::spawn(async move {
            let guard = guard;
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = watch_tx.closed() => {}
                // Already removed by a publish pass
                _ = &mut removed_rx => return,
            }

            if guard.0.remove(&key, id).await {
                info!(key = %key, subscriber = id, "Subscription closed");
            }
        });
    }

    // == Publish ==
    /// Serializes `payload` once and delivers it to every subscriber of
    /// `event_type`, plus the subscribers of `event_type:entity_id` when an
    /// entity id greater than zero is given.
    ///
    /// Delivery never waits: a full subscriber queue marks that subscriber as
    /// slow, and slow or disconnected subscribers are closed after the pass.
    /// Publishing with no subscribers is a no-op.
    ///
    /// Returns the number of subscribers the frame was queued for. The only
    /// error is a serialization failure, in which case nothing is delivered.
    pub async fn publish<T>(&self, event_type: &str, payload: &T, entity_id: Option<u64>) -> Result<usize>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_string(payload)?;
        let frame = event_frame(event_type, &data);

        let mut keys = vec![event_type.to_string()];
        if entity_id.is_some_and(|id| id > 0) {
            keys.push(subscription_key(event_type, entity_id));
        }

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let subscribers = self.inner.subscribers.read().await;
            for key in &keys {
                let Some(set) = subscribers.get(key) else {
                    continue;
                };
                for (id, slot) in set {
                    match slot.tx.try_send(frame.clone()) {
                        Ok(()) => delivered += 1,
                        Err(TrySendError::Full(_)) => {
                            warn!(key = %key, subscriber = id, "Channel is full, dropping slow subscriber");
                            dead.push((key.as_str(), *id));
                        }
                        Err(TrySendError::Closed(_)) => dead.push((key.as_str(), *id)),
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.inner.subscribers.write().await;
            for (key, id) in dead {
                BroadcasterInner::remove_locked(&mut subscribers, key, id);
            }
        }

        debug!(event_type, delivered, "Published event");
        Ok(delivered)
    }

    // == Introspection ==
    /// Number of live subscribers under an exact subscription key.
    pub async fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .subscribers
            .read()
            .await
            .get(key)
            .map_or(0, HashMap::len)
    }

    /// Number of subscription keys with at least one live subscriber.
    pub async fn key_count(&self) -> usize {
        self.inner.subscribers.read().await.len()
    }

    /// Number of watcher tasks still running.
    pub fn active_watchers(&self) -> usize {
        self.inner.watchers.load(Ordering::Acquire)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
