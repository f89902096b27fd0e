//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the gated fetch operation (GET /fetch/*path)
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// The cache key the upstream path resolved to
    pub key: String,
    /// The upstream response body
    pub value: String,
}

impl FetchResponse {
    /// Creates a new FetchResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the cache delete operation (DELETE /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The key that was targeted
    pub key: String,
    /// Whether an entry was actually removed
    pub deleted: bool,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, deleted: bool) -> Self {
        Self {
            key: key.into(),
            deleted,
        }
    }
}

/// Response body for the prune operation (POST /cache/prune)
#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    /// Number of expired entries removed
    pub removed: usize,
}

/// Response body for the clear operation (POST /cache/clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
}

impl ClearResponse {
    /// Creates a new ClearResponse
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

/// Cache section of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of LRU evictions
    pub evictions: u64,
    /// Number of TTL expirations
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsBody {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Rate limiter section of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct LimiterStatsBody {
    /// Tokens currently available
    pub available_tokens: u64,
    /// Callers currently queued for admission
    pub queue_size: usize,
}

/// Response body for the stats endpoint (GET /stats)
///
/// A disabled subsystem serializes as null.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Cache counters, when caching is enabled
    pub cache: Option<CacheStatsBody>,
    /// Limiter occupancy, when rate limiting is enabled
    pub rate_limiter: Option<LimiterStatsBody>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
