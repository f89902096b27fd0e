//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::time::Duration;

// == Cache Config ==
/// Configuration for the TTL/LRU cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether the caching step is enabled at all
    pub enabled: bool,
    /// Default TTL applied to entries stored without an explicit override
    pub ttl: Duration,
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(60 * 60),
            max_size: 1000,
        }
    }
}

// == Rate Limit Config ==
/// Configuration for the token-bucket rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether the admission step is enabled at all
    pub enabled: bool,
    /// Tokens added per refill interval (also the bucket capacity)
    pub max_requests: u64,
    /// Refill interval
    pub interval: Duration,
    /// Whether callers may queue for a token instead of failing fast
    pub queue: bool,
    /// Maximum number of callers allowed to queue at once
    pub max_queue_size: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 50,
            interval: Duration::from_secs(1),
            queue: true,
            max_queue_size: 100,
        }
    }
}

// == Gateway Config ==
/// Full configuration for the gateway binary.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache subsystem configuration
    pub cache: CacheConfig,
    /// Rate limiter subsystem configuration
    pub rate_limit: RateLimitConfig,
    /// Base URL the gated fetch path proxies to
    pub upstream_base_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background cache prune interval in seconds (0 disables the task)
    pub prune_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Enable the caching step (default: true)
    /// - `CACHE_TTL_MS` - Default entry TTL in milliseconds (default: 3600000)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `RATE_LIMIT_ENABLED` - Enable the admission step (default: true)
    /// - `RATE_MAX_REQUESTS` - Tokens per interval (default: 50)
    /// - `RATE_INTERVAL_MS` - Refill interval in milliseconds (default: 1000)
    /// - `RATE_QUEUE` - Queue callers when out of tokens (default: true)
    /// - `RATE_MAX_QUEUE_SIZE` - Maximum queued callers (default: 100)
    /// - `UPSTREAM_BASE_URL` - Upstream base URL (default: http://127.0.0.1:8080)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PRUNE_INTERVAL_SECS` - Prune frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache: CacheConfig {
                enabled: env_parse("CACHE_ENABLED", defaults.cache.enabled),
                ttl: Duration::from_millis(env_parse(
                    "CACHE_TTL_MS",
                    defaults.cache.ttl.as_millis() as u64,
                )),
                max_size: env_parse("CACHE_MAX_SIZE", defaults.cache.max_size),
            },
            rate_limit: RateLimitConfig {
                enabled: env_parse("RATE_LIMIT_ENABLED", defaults.rate_limit.enabled),
                max_requests: env_parse("RATE_MAX_REQUESTS", defaults.rate_limit.max_requests),
                interval: Duration::from_millis(env_parse(
                    "RATE_INTERVAL_MS",
                    defaults.rate_limit.interval.as_millis() as u64,
                )),
                queue: env_parse("RATE_QUEUE", defaults.rate_limit.queue),
                max_queue_size: env_parse(
                    "RATE_MAX_QUEUE_SIZE",
                    defaults.rate_limit.max_queue_size,
                ),
            },
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .unwrap_or(defaults.upstream_base_url),
            server_port: env_parse("SERVER_PORT", defaults.server_port),
            prune_interval: env_parse("PRUNE_INTERVAL_SECS", defaults.prune_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            upstream_base_url: "http://127.0.0.1:8080".to_string(),
            server_port: 3000,
            prune_interval: 60,
        }
    }
}

/// Parses an environment variable, falling back to the default when unset
/// or malformed.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
