//! Configuration Module
//!
//! Handles loading and managing relay configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::events::DEFAULT_CHANNEL_CAPACITY;

/// Relay configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Lifetime of cached ranging entries, in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of cached ranging entries
    pub cache_max_entries: usize,
    /// Frames a live subscriber may have pending before it is dropped
    pub subscriber_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_TTL_SECS` - Cache entry TTL in seconds (default: 60)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 5000)
    /// - `SUBSCRIBER_CAPACITY` - Per-subscriber queue depth (default: 1024)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            subscriber_capacity: env_or("SUBSCRIBER_CAPACITY", defaults.subscriber_capacity),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            cache_ttl_secs: 60,
            cache_max_entries: 5000,
            subscriber_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Parses `key` from the environment, falling back on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.cache_max_entries, 5000);
        assert_eq!(config.subscriber_capacity, 1024);
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_env_or_parses_and_falls_back() {
        env::set_var("RELAY_TEST_PORT_OK", " 9000 ");
        env::set_var("RELAY_TEST_PORT_BAD", "not-a-port");

        assert_eq!(env_or("RELAY_TEST_PORT_OK", 1u16), 9000);
        assert_eq!(env_or("RELAY_TEST_PORT_BAD", 1u16), 1);
        assert_eq!(env_or("RELAY_TEST_PORT_MISSING", 7u16), 7);

        env::remove_var("RELAY_TEST_PORT_OK");
        env::remove_var("RELAY_TEST_PORT_BAD");
    }
}
