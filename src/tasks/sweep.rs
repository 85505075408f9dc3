//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;

use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::Cache;

/// Floor for the sweep period so a tiny TTL cannot spin the task.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Sweep period for a given TTL: half the TTL, never below one millisecond.
pub fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 2).max(MIN_SWEEP_INTERVAL)
}

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task ticks every `ttl / 2` on a fixed schedule, takes the cache's write lock and drops
/// every entry whose deadline has passed, independent of access patterns.
/// It only holds a weak reference, so it stops on its own once every
/// `Cache` handle is dropped.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache: Cache<String, Ranging> = Cache::new(Duration::from_secs(60), 5000);
/// let sweep_handle = spawn_sweep_task(&cache);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V>(cache: &Cache<K, V>) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let period = sweep_interval(cache.ttl());
    let weak = cache.downgrade();

    tokio::spawn(async move {
        info!("Starting cache sweep task with interval of {:?}", period);

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let Some(cache) = weak.upgrade() else {
                debug!("Cache dropped, stopping sweep task");
                break;
            };

            let removed = cache.sweep_expired().await;

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_interval_is_half_ttl() {
        assert_eq!(sweep_interval(Duration::from_secs(60)), Duration::from_secs(30));
        assert_eq!(sweep_interval(Duration::ZERO), MIN_SWEEP_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_removes_expired_entries() {
        let cache: Cache<String, String> = Cache::new(Duration::from_secs(2), 100);
        cache.set("expire_soon".to_string(), "value".to_string()).await;

        let handle = spawn_sweep_task(&cache);

        // Deadline at 2s, sweeps at 1s, 2s, 3s
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(cache.len().await, 0, "Expired entry should have been swept");
        assert_eq!(cache.stats().await.expired, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache: Cache<String, String> = Cache::new(Duration::from_secs(3600), 100);
        cache.set("long_lived".to_string(), "value".to_string()).await;

        let handle = spawn_sweep_task(&cache);
        tokio::time::sleep(Duration::from_secs(1801)).await;

        assert_eq!(cache.get(&"long_lived".to_string()).await.as_deref(), Some("value"));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_stops_when_cache_dropped() {
        let cache: Cache<String, String> = Cache::new(Duration::from_secs(2), 100);
        let handle = spawn_sweep_task(&cache);

        drop(cache);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(handle.is_finished(), "Task should exit once the cache is gone");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_ticks_every_half_ttl() {
        let cache: Cache<u32, u32> = Cache::new(Duration::from_secs(2), 100);
        let handle = spawn_sweep_task(&cache);

        // Ticks at 1s, 2s, 3s, 4s; deadlines at 2s and 3.5s
        cache.set(1, 1).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cache.set(2, 2).await;
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(cache.stats().await.expired, 1);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(cache.stats().await.expired, 2);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache: Cache<String, String> = Cache::new(Duration::from_secs(2), 100);
        let handle = spawn_sweep_task(&cache);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
