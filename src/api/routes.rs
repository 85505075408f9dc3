//! API Routes
//!
//! Configures the Axum router with all relay endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, ingest_handler, latest_ranging, stats_handler, stream_all_rangings,
    stream_ranging_by_id, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /rangings/stream` - Live stream of every ranging event
/// - `GET /rangings/:id/stream` - Live stream of one ranging id
/// - `GET /rangings/latest/:source/:destination` - Latest cached ranging for a pair
/// - `POST /telemetry/*topic` - Dispatch a raw telemetry payload on `topic`
/// - `GET /stats` - Cache and stream statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/rangings/stream", get(stream_all_rangings))
        .route("/rangings/:id/stream", get(stream_ranging_by_id))
        .route("/rangings/latest/:source/:destination", get(latest_ranging))
        .route("/telemetry/*topic", post(ingest_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
