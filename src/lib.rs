//! Gatecache - a gated cache layer for upstream APIs
//!
//! Sits in front of a rate-limited, latency-sensitive upstream call and
//! provides two cooperating guarantees: repeated calls with identical
//! semantic parameters are served from a bounded, time-expiring cache, and
//! calls that must reach the upstream are throttled to a configurable rate
//! with bounded FIFO queuing.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod limiter;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, TtlLruCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, Config, RateLimitConfig};
pub use error::{GateError, GateResult, RateLimitError};
pub use gate::{CacheableResponse, RequestGate};
pub use limiter::RateLimiter;
pub use tasks::spawn_prune_task;
