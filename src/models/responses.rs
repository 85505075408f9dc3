//! Response DTOs for the relay API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::routing::DispatchReport;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Ranging cache counters
    pub cache: CacheStats,
    /// Cache hit rate (hits / (hits + misses))
    pub cache_hit_rate: f64,
    /// Subscription keys with at least one live stream
    pub stream_keys: usize,
    /// Live stream subscriptions
    pub active_streams: usize,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, stream_keys: usize, active_streams: usize) -> Self {
        Self {
            cache_hit_rate: cache.hit_rate(),
            cache,
            stream_keys,
            active_streams,
        }
    }
}

/// Response body for telemetry ingestion (POST /telemetry/*topic)
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    /// Topic the payload was dispatched on
    pub topic: String,
    /// Handlers that matched the topic
    pub matched: usize,
    /// Matched handlers that failed
    pub failed: usize,
}

impl IngestResponse {
    pub fn new(topic: impl Into<String>, report: DispatchReport) -> Self {
        Self {
            topic: topic.into(),
            matched: report.matched,
            failed: report.failed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_hit_rate() {
        let cache = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::new(cache, 2, 3);
        assert!((resp.cache_hit_rate - 0.8).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["cache"]["hits"], 80);
        assert_eq!(json["active_streams"], 3);
    }

    #[test]
    fn test_ingest_response_serialize() {
        let resp = IngestResponse::new("a/b", DispatchReport { matched: 2, failed: 1 });
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"topic":"a/b","matched":2,"failed":1}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
