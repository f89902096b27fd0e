//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, fetch_handler, health_handler, prune_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /fetch/*path` - Gated fetch of an upstream resource
/// - `DELETE /cache/:key` - Remove a single cache entry
/// - `POST /cache/prune` - Eagerly sweep expired entries
/// - `POST /cache/clear` - Remove all cache entries
/// - `GET /stats` - Cache counters and limiter occupancy
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/fetch/*path", get(fetch_handler))
        .route("/cache/prune", post(prune_handler))
        .route("/cache/clear", post(clear_handler))
        .route("/cache/:key", delete(delete_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
