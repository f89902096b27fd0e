//! Gatecache - a caching, rate-limiting gateway for upstream APIs
//!
//! Serves a gated fetch path in front of a configured upstream base URL:
//! repeated requests are answered from a TTL/LRU cache, and requests that
//! must reach the upstream pass through a token-bucket rate limiter.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatecache::api::create_router;
use gatecache::{spawn_prune_task, AppState, Config};

/// Main entry point for the gatecache gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the request gate (cache + rate limiter) and HTTP client
/// 4. Start the background cache prune task (if enabled)
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatecache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting gatecache gateway");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: cache(enabled={}, ttl={:?}, max_size={}), \
         rate_limit(enabled={}, max_requests={}, interval={:?}, queue={}, max_queue_size={}), \
         upstream={}, port={}",
        config.cache.enabled,
        config.cache.ttl,
        config.cache.max_size,
        config.rate_limit.enabled,
        config.rate_limit.max_requests,
        config.rate_limit.interval,
        config.rate_limit.queue,
        config.rate_limit.max_queue_size,
        config.upstream_base_url,
        config.server_port
    );

    // Build application state around the gate
    let state = AppState::from_config(&config);
    info!("Request gate initialized");

    // Start the background prune task when caching is on and an interval is set
    let prune_handle = match state.gate.cache() {
        Some(cache) if config.prune_interval > 0 => {
            let handle = spawn_prune_task(cache.clone(), config.prune_interval);
            info!("Background prune task started");
            Some(handle)
        }
        _ => None,
    };

    // Create router with all endpoints
    let app = create_router(state.clone());

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(prune_handle))
        .await
        .context("Server error")?;

    // Reject any queued admissions deterministically before exiting
    state.gate.dispose().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the prune task and allows graceful shutdown.
async fn shutdown_signal(prune_handle: Option<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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

    if let Some(handle) = prune_handle {
        handle.abort();
        warn!("Prune task aborted");
    }
}
