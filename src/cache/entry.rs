//! Cache Entry Module
//!
//! Defines a single cache slot with its expiry deadline and recency data.

use tokio::time::{Duration, Instant};

/// Upper bound applied when `now + ttl` would overflow the clock.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute instant after which the entry is no longer served
    pub expires_at: Instant,
    /// Last time the entry was written or read
    pub last_access: Instant,
    /// Monotonic access counter, breaks ties between equal `last_access` instants
    pub access_seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time to live, measured from now
    /// * `seq` - Access sequence number assigned by the owning cache
    pub fn new(value: V, ttl: Duration, seq: u64) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + MAX_TTL);

        Self {
            value,
            expires_at,
            last_access: now,
            access_seq: seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so a
    /// fully elapsed TTL never serves the value again.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Touch ==
    /// Marks the entry as just accessed.
    pub fn touch(&mut self, seq: u64) {
        self.last_access = Instant::now();
        self.access_seq = seq;
    }

    /// Ordering key for LRU eviction; the smallest value is the oldest entry.
    pub fn recency(&self) -> (Instant, u64) {
        (self.last_access, self.access_seq)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_not_expired_before_deadline() {
        let entry = CacheEntry::new("test_value", Duration::from_secs(60), 0);

        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value", Duration::from_secs(1), 0);

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("test", Duration::from_secs(5), 0);

        assert!(entry.is_expired_at(entry.expires_at), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(entry.expires_at - Duration::from_millis(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_updates_recency() {
        let mut entry = CacheEntry::new(1u32, Duration::from_secs(60), 3);
        let before = entry.recency();

        tokio::time::advance(Duration::from_secs(1)).await;
        entry.touch(7);

        assert!(entry.recency() > before);
        assert_eq!(entry.access_seq, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_breaks_ties() {
        let first = CacheEntry::new('a', Duration::from_secs(60), 1);
        let second = CacheEntry::new('b', Duration::from_secs(60), 2);

        assert_eq!(first.last_access, second.last_access);
        assert!(first.recency() < second.recency());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new((), Duration::MAX, 0);
        assert!(!entry.is_expired());
    }
}
