//! Telemetry Relay - real-time distribution of device telemetry
//!
//! Routes inbound telemetry by wildcard topic, fans published events out to
//! live subscribers, and keeps recent readings in a TTL/LRU cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod routing;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use cache::Cache;
pub use config::Config;
pub use events::{CancelToken, EventBroadcaster};
pub use routing::{TopicHandler, TopicRouter};
pub use tasks::spawn_sweep_task;
