//! Telemetry Relay - real-time distribution of device telemetry
//!
//! Routes inbound telemetry by wildcard topic, fans published events out to
//! live subscribers, and keeps recent readings in a TTL/LRU cache.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telemetry_relay::api::create_router;
use telemetry_relay::{spawn_sweep_task, AppState, CancelToken, Config};

/// Main entry point for the relay.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build cache, broadcaster and topic router
/// 4. Start background cache sweep task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telemetry_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Telemetry Relay");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_ttl={}s, cache_max_entries={}, subscriber_capacity={}",
        config.server_port, config.cache_ttl_secs, config.cache_max_entries, config.subscriber_capacity
    );

    let state = AppState::from_config(&config);
    info!(
        "Topic router ready, listening on: {}",
        state.router.all_topics().join(", ")
    );

    let sweep_handle = spawn_sweep_task(state.ranging_cache.cache());
    info!("Background cache sweep task started");

    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle, shutdown))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, aborts the sweep task and cancels every open event stream so
/// the graceful shutdown is not held up by long-lived responses.
async fn shutdown_signal(sweep_handle: JoinHandle<()>, streams: CancelToken) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    streams.cancel();
    sweep_handle.abort();
    warn!("Event streams closed and sweep task aborted");
}
