//! Ranging telemetry: UWB distance measurements between station pairs.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::debug;

use crate::cache::Cache;
use crate::events::EventBroadcaster;
use crate::routing::{RawMessage, TopicHandler};

/// Event type ranging updates are published under.
pub const RANGING_EVENT_TYPE: &str = "ranging";

/// Topic devices report ranging measurements on.
pub const RANGING_TOPIC: &str = "gpsno/simulation/devices/+/uwb/ranging";

/// One measurement as reported by a device.
#[derive(Debug, Clone, Deserialize)]
struct RangingReport {
    source_address: String,
    destination_address: String,
    distance: DistanceReport,
}

#[derive(Debug, Clone, Deserialize)]
struct DistanceReport {
    raw_distance: f64,
    #[serde(default)]
    scaled_distance: f64,
}

/// A ranging measurement as stored and published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranging {
    pub id: u64,
    pub source_address: String,
    pub destination_address: String,
    pub raw_distance: f64,
    pub scaled_distance: f64,
    pub created_at: DateTime<Utc>,
}

// == Ranging Cache ==
/// Latest ranging per (source, destination) station pair.
#[derive(Clone)]
pub struct RangingCache {
    by_pair: Cache<String, Ranging>,
}

impl RangingCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            by_pair: Cache::new(ttl, max_entries),
        }
    }

    fn pair_key(source_mac: &str, destination_mac: &str) -> String {
        format!("{source_mac}:{destination_mac}")
    }

    pub async fn get(&self, source_mac: &str, destination_mac: &str) -> Option<Ranging> {
        self.by_pair
            .get(&Self::pair_key(source_mac, destination_mac))
            .await
    }

    pub async fn set(&self, ranging: &Ranging) {
        let key = Self::pair_key(&ranging.source_address, &ranging.destination_address);
        self.by_pair.set(key, ranging.clone()).await;
    }

    pub async fn clear(&self) {
        self.by_pair.clear().await;
    }

    /// Underlying generic cache, for sweeping and statistics.
    pub fn cache(&self) -> &Cache<String, Ranging> {
        &self.by_pair
    }
}

// == Ranging Subscription ==
/// Decodes ranging reports, caches them and publishes each one live.
pub struct RangingSubscription {
    cache: RangingCache,
    broadcaster: EventBroadcaster,
    next_id: AtomicU64,
}

impl RangingSubscription {
    pub fn new(cache: RangingCache, broadcaster: EventBroadcaster) -> Self {
        Self {
            cache,
            broadcaster,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl TopicHandler for RangingSubscription {
    fn topics(&self) -> Vec<String> {
        vec![RANGING_TOPIC.to_string()]
    }

    async fn handle(&self, message: RawMessage) -> anyhow::Result<()> {
        let reports: Vec<RangingReport> = serde_json::from_slice(&message.payload)
            .with_context(|| format!("invalid ranging payload on {}", message.topic))?;

        for report in reports {
            let ranging = Ranging {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                source_address: report.source_address,
                destination_address: report.destination_address,
                raw_distance: report.distance.raw_distance,
                scaled_distance: report.distance.scaled_distance,
                created_at: Utc::now(),
            };

            self.cache.set(&ranging).await;
            self.broadcaster
                .publish(RANGING_EVENT_TYPE, &ranging, Some(ranging.id))
                .await?;
        }

        debug!(topic = %message.topic, "Ranging reports processed");
        Ok(())
    }
}
