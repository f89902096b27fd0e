//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    Json,
};

use crate::config::Config;
use crate::error::GateError;
use crate::gate::RequestGate;
use crate::models::{
    CacheStatsBody, ClearResponse, DeleteResponse, FetchResponse, HealthResponse,
    LimiterStatsBody, PruneResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The gated cache layer in front of the upstream
    pub gate: Arc<RequestGate<String>>,
    /// HTTP client used by the producer
    pub client: reqwest::Client,
    /// Base URL the fetch path proxies to
    pub upstream_base_url: String,
}

impl AppState {
    /// Creates a new AppState around an existing gate.
    pub fn new(gate: RequestGate<String>, upstream_base_url: impl Into<String>) -> Self {
        Self {
            gate: Arc::new(gate),
            client: reqwest::Client::new(),
            upstream_base_url: upstream_base_url.into(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let gate = RequestGate::new(&config.cache, &config.rate_limit);
        Self::new(gate, config.upstream_base_url.clone())
    }
}

/// Handler for GET /fetch/*path
///
/// Serves the upstream resource through the gate: cache hit, or admission
/// plus upstream GET. The cache key is the upstream path including its
/// query string.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<FetchResponse>, GateError<reqwest::Error>> {
    let key = match &query {
        Some(query) => format!("{path}?{query}"),
        None => path.clone(),
    };
    let url = format!(
        "{}/{}",
        state.upstream_base_url.trim_end_matches('/'),
        key
    );

    let client = state.client.clone();
    let value = state
        .gate
        .fetch(&key, || async move {
            client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        })
        .await?;

    Ok(Json(FetchResponse::new(key, value)))
}

/// Handler for DELETE /cache/:key
///
/// Removes a single cache entry. A no-op when caching is disabled.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = match state.gate.cache() {
        Some(cache) => cache.write().await.delete(&key),
        None => false,
    };

    Json(DeleteResponse::new(key, deleted))
}

/// Handler for POST /cache/prune
///
/// Eagerly sweeps expired entries and reports how many were removed.
pub async fn prune_handler(State(state): State<AppState>) -> Json<PruneResponse> {
    let removed = match state.gate.cache() {
        Some(cache) => cache.write().await.prune(),
        None => 0,
    };

    Json(PruneResponse { removed })
}

/// Handler for POST /cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    if let Some(cache) = state.gate.cache() {
        cache.write().await.clear();
    }

    Json(ClearResponse::cleared())
}

/// Handler for GET /stats
///
/// Reports cache counters and limiter occupancy; a disabled subsystem
/// reports null.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = match state.gate.cache() {
        Some(cache) => Some(CacheStatsBody::from(cache.read().await.stats())),
        None => None,
    };

    let rate_limiter = match state.gate.limiter() {
        Some(limiter) => Some(LimiterStatsBody {
            available_tokens: limiter.available_tokens().await,
            queue_size: limiter.queue_size().await,
        }),
        None => None,
    };

    Json(StatsResponse {
        cache,
        rate_limiter,
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
