//! API Handlers
//!
//! HTTP request handlers for each relay endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
    Json,
};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::events::{event_stream_response, CancelToken, EventBroadcaster};
use crate::models::{HealthResponse, IngestResponse, StatsResponse};
use crate::routing::TopicRouter;
use crate::telemetry::{build_router, Ranging, RangingCache, RANGING_EVENT_TYPE};

/// Application state shared across all handlers.
///
/// Every component is created once here and shared by handle; nothing is a
/// process-wide global.
#[derive(Clone)]
pub struct AppState {
    /// Latest ranging per station pair
    pub ranging_cache: RangingCache,
    /// Live event fan-out
    pub broadcaster: EventBroadcaster,
    /// Inbound telemetry dispatch
    pub router: Arc<TopicRouter>,
    /// Cancelled on shutdown to end every open stream
    pub shutdown: CancelToken,
}

impl AppState {
    /// Creates a new AppState from already-built components.
    pub fn new(ranging_cache: RangingCache, broadcaster: EventBroadcaster, router: TopicRouter) -> Self {
        Self {
            ranging_cache,
            broadcaster,
            router: Arc::new(router),
            shutdown: CancelToken::new(),
        }
    }

    /// Creates a new AppState from configuration, with every telemetry
    /// handler registered.
    pub fn from_config(config: &Config) -> Self {
        let ranging_cache = RangingCache::new(config.cache_ttl(), config.cache_max_entries);
        let broadcaster = EventBroadcaster::with_capacity(config.subscriber_capacity);
        let router = build_router(&ranging_cache, &broadcaster);
        Self::new(ranging_cache, broadcaster, router)
    }
}

/// Handler for GET /rangings/stream
///
/// Streams every ranging event.
pub async fn stream_all_rangings(State(state): State<AppState>) -> Response {
    event_stream_response(&state.broadcaster, &state.shutdown, RANGING_EVENT_TYPE, None).await
}

/// Handler for GET /rangings/:id/stream
///
/// Streams the ranging events of a single ranging id.
pub async fn stream_ranging_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id: u64 = id
        .parse()
        .map_err(|_| RelayError::InvalidRequest("Invalid ID format".to_string()))?;

    Ok(event_stream_response(&state.broadcaster, &state.shutdown, RANGING_EVENT_TYPE, Some(id)).await)
}

/// Handler for GET /rangings/latest/:source/:destination
///
/// Returns the most recent cached ranging between two stations.
pub async fn latest_ranging(
    State(state): State<AppState>,
    Path((source, destination)): Path<(String, String)>,
) -> Result<Json<Ranging>> {
    state
        .ranging_cache
        .get(&source, &destination)
        .await
        .map(Json)
        .ok_or_else(|| RelayError::NotFound(format!("No ranging for {source} -> {destination}")))
}

/// Handler for POST /telemetry/*topic
///
/// Dispatches the raw request body as a telemetry message on `topic`.
pub async fn ingest_handler(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    payload: Bytes,
) -> Json<IngestResponse> {
    let report = state.router.dispatch(&topic, payload).await;
    Json(IngestResponse::new(topic, report))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.ranging_cache.cache().stats().await;
    let stream_keys = state.broadcaster.key_count().await;

    Json(StatsResponse::new(
        cache,
        stream_keys,
        state.broadcaster.active_watchers(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
