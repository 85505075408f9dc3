//! Cache Store Module
//!
//! Generic key/value cache with per-entry TTL and least-recently-used eviction.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::cache::stats::CacheCounters;
use crate::cache::{CacheEntry, CacheStats};

// == Cache ==
/// Thread-safe cache bounded by both time and item count.
///
/// Cloning is cheap and every clone shares the same backing store. Lookups
/// take the read lock; a hit then refreshes the entry's last-access time in a
/// second, short write section so the lookup itself never blocks other readers.
pub struct Cache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

struct CacheInner<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
    counters: CacheCounters,
    access_seq: AtomicU64,
}

/// Non-owning handle used by background tasks so they never keep a cache alive.
pub(crate) struct WeakCache<K, V> {
    inner: Weak<CacheInner<K, V>>,
}

impl<K, V> WeakCache<K, V> {
    pub(crate) fn upgrade(&self) -> Option<Cache<K, V>> {
        self.inner.upgrade().map(|inner| Cache { inner })
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of every entry, reset on each `set`
    /// * `max_entries` - Item bound; a value of zero is raised to one
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        if max_entries == 0 {
            warn!("Cache capacity of 0 requested, using 1");
        }

        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                ttl,
                max_entries: max_entries.max(1),
                counters: CacheCounters::default(),
                access_seq: AtomicU64::new(0),
            }),
        }
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// Absent and expired entries both yield `None`. A hit refreshes the
    /// entry's last-access time.
    pub async fn get(&self, key: &K) -> Option<V> {
        let value = {
            let entries = self.inner.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => entry.value.clone(),
                _ => {
                    self.inner.counters.record_miss();
                    return None;
                }
            }
        };

        {
            let mut entries = self.inner.entries.write().await;
            // The entry may have been deleted or replaced between the two sections.
            if let Some(entry) = entries.get_mut(key) {
                entry.touch(self.next_seq());
            }
        }

        self.inner.counters.record_hit();
        Some(value)
    }

    // == Set ==
    /// Stores `value` under `key` with a fresh TTL.
    ///
    /// Inserting a new key into a full cache first evicts the entry with the
    /// oldest last-access time, found by a linear scan. Overwriting an
    /// existing key never evicts.
    pub async fn set(&self, key: K, value: V) {
        let mut entries = self.inner.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.inner.max_entries {
            if let Some(oldest) = oldest_key(&entries) {
                entries.remove(&oldest);
                self.inner.counters.record_eviction();
                debug!("Evicted least recently used cache entry");
            }
        }

        let entry = CacheEntry::new(value, self.inner.ttl, self.next_seq());
        entries.insert(key, entry);
    }

    // == Delete ==
    /// Removes an entry by key. Missing keys are ignored.
    pub async fn delete(&self, key: &K) {
        self.inner.entries.write().await.remove(key);
    }

    // == Clear ==
    /// Removes every entry.
    pub async fn clear(&self) {
        self.inner.entries.write().await.clear();
    }

    // == Sweep Expired ==
    /// Removes all entries whose deadline has passed.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - entries.len();
        self.inner.counters.record_expired(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.inner.counters.snapshot(total)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Cache<K, V> {
    /// Entry lifetime configured at construction.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Maximum number of entries.
    pub fn max_entries(&self) -> usize {
        self.inner.max_entries
    }

    pub(crate) fn downgrade(&self) -> WeakCache<K, V> {
        WeakCache {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn next_seq(&self) -> u64 {
        self.inner.access_seq.fetch_add(1, Ordering::Relaxed)
    }
}

/// Linear scan for the least recently accessed key.
fn oldest_key<K: Clone, V>(entries: &HashMap<K, CacheEntry<V>>) -> Option<K> {
    entries
        .iter()
        .min_by_key(|(_, entry)| entry.recency())
        .map(|(key, _)| key.clone())
}
