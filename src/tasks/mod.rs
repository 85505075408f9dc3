//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: Removes expired cache entries every half TTL

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_interval};
