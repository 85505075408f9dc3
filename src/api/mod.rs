//! API Module
//!
//! HTTP handlers and routing for the relay.
//!
//! # Endpoints
//! - `GET /rangings/stream` - Live stream of every ranging event
//! - `GET /rangings/:id/stream` - Live stream of one ranging id
//! - `GET /rangings/latest/:source/:destination` - Latest cached ranging
//! - `POST /telemetry/*topic` - Ingest a raw telemetry payload
//! - `GET /stats` - Cache and stream statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
