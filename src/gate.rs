//! Request Gate Module
//!
//! Coordinates a single logical "fetch-or-compute" per request: cache
//! lookup, admission acquisition, delegation to the caller-supplied
//! producer, and cache population.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::TtlLruCache;
use crate::config::{CacheConfig, RateLimitConfig};
use crate::error::{GateError, GateResult};
use crate::limiter::RateLimiter;

// == Cacheable Response ==
/// Policy deciding whether a produced value is worth caching.
///
/// An empty result that is actually an upstream fluke should be retried on
/// the next call rather than frozen in cache for the full TTL, so empty
/// values report false.
pub trait CacheableResponse {
    /// Whether this value should be written to the cache.
    fn should_cache(&self) -> bool {
        true
    }
}

impl CacheableResponse for String {
    fn should_cache(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> CacheableResponse for Vec<T> {
    fn should_cache(&self) -> bool {
        !self.is_empty()
    }
}

impl CacheableResponse for serde_json::Value {
    fn should_cache(&self) -> bool {
        match self {
            serde_json::Value::Null => false,
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(a) => !a.is_empty(),
            _ => true,
        }
    }
}

// == Request Gate ==
/// Gates calls to a rate-limited upstream behind a TTL/LRU cache and a
/// token-bucket rate limiter.
///
/// Either subsystem may be disabled by configuration, in which case its
/// steps are skipped. Concurrent cache-misses for the same key each acquire
/// admission and invoke the producer independently; there is no per-key
/// in-flight deduplication.
#[derive(Debug)]
pub struct RequestGate<V> {
    cache: Option<Arc<RwLock<TtlLruCache<V>>>>,
    limiter: Option<RateLimiter>,
}

impl<V> RequestGate<V>
where
    V: CacheableResponse + Clone + Send + Sync,
{
    // == Constructor ==
    /// Creates a gate from cache and limiter configuration.
    pub fn new(cache_config: &CacheConfig, rate_limit_config: &RateLimitConfig) -> Self {
        let cache = cache_config.enabled.then(|| {
            Arc::new(RwLock::new(TtlLruCache::new(
                cache_config.max_size,
                cache_config.ttl,
            )))
        });
        let limiter = rate_limit_config
            .enabled
            .then(|| RateLimiter::new(rate_limit_config));

        Self { cache, limiter }
    }

    /// Creates a gate around pre-built subsystems, for callers that want to
    /// share handles or inject clocks.
    pub fn from_parts(
        cache: Option<Arc<RwLock<TtlLruCache<V>>>>,
        limiter: Option<RateLimiter>,
    ) -> Self {
        Self { cache, limiter }
    }

    // == Fetch ==
    /// Serves `key` from cache when possible; otherwise acquires admission,
    /// invokes `producer`, and caches a successful non-empty result under
    /// the default TTL.
    ///
    /// Admission failures and producer failures propagate unchanged; the
    /// producer is never invoked on an admission failure, and nothing is
    /// cached on a producer failure.
    pub async fn fetch<F, Fut, E>(&self, key: &str, producer: F) -> GateResult<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.write().await.get(key) {
                debug!(key, "gated fetch served from cache");
                return Ok(value);
            }
        }

        if let Some(limiter) = &self.limiter {
            limiter.acquire().await.map_err(GateError::RateLimit)?;
        }

        let value = producer().await.map_err(GateError::Producer)?;

        if let Some(cache) = &self.cache {
            if value.should_cache() {
                cache.write().await.set(key, value.clone(), None);
            } else {
                debug!(key, "empty producer result not cached");
            }
        }

        Ok(value)
    }

    // == Accessors ==
    /// The cache handle, when caching is enabled.
    pub fn cache(&self) -> Option<&Arc<RwLock<TtlLruCache<V>>>> {
        self.cache.as_ref()
    }

    /// The rate limiter, when rate limiting is enabled.
    pub fn limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    // == Dispose ==
    /// Clears the cache and disposes the limiter, rejecting any queued
    /// admissions. Idempotent.
    pub async fn dispose(&self) {
        if let Some(cache) = &self.cache {
            cache.write().await.clear();
        }
        if let Some(limiter) = &self.limiter {
            limiter.dispose().await;
        }
    }
}
