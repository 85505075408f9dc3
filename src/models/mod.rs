//! Response models for the relay API
//!
//! Error bodies are produced by [`crate::error::RelayError`].

pub mod responses;

// Re-export commonly used types
pub use responses::{HealthResponse, IngestResponse, StatsResponse};
