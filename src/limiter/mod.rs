//! Rate Limiter Module
//!
//! Token-bucket rate limiting with blocking acquisition, non-blocking
//! probing and bounded FIFO queuing.
//!
//! - **bucket**: the pure refill state machine
//! - **admission**: one-shot handles for queued callers
//! - **core**: the async [`RateLimiter`] tying bucket, queue and the
//!   periodic drain task together

mod admission;
mod bucket;
mod core;

// Re-export public types
pub use admission::QueuedAdmission;
pub use bucket::TokenBucket;
pub use core::RateLimiter;
