//! Token Bucket Module
//!
//! Pure refill state machine for the rate limiter: token count plus refill
//! anchor, with no queue or timer concerns.

use std::time::Duration;

// == Token Bucket ==
/// Refillable token pool over a capacity `C` and refill interval `I`.
///
/// The bucket starts full. Refill grants `C` tokens per whole elapsed
/// interval (capped at `C`) and advances the anchor by whole intervals
/// only, so fractional interval progress is never lost between calls.
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum tokens, and tokens granted per interval
    capacity: u64,
    /// Refill interval in milliseconds
    interval_ms: u64,
    /// Currently available tokens
    tokens: u64,
    /// Refill anchor (Unix milliseconds)
    anchor_ms: u64,
}

impl TokenBucket {
    // == Constructor ==
    /// Creates a full bucket anchored at `now_ms`.
    ///
    /// A zero interval is clamped to one millisecond to keep the refill
    /// arithmetic defined.
    pub fn new(capacity: u64, interval: Duration, now_ms: u64) -> Self {
        Self {
            capacity,
            interval_ms: (interval.as_millis() as u64).max(1),
            tokens: capacity,
            anchor_ms: now_ms,
        }
    }

    // == Refill ==
    /// Grants tokens for every whole interval elapsed since the anchor.
    ///
    /// The anchor advances by the granted intervals, not to `now_ms`.
    pub fn refill(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.anchor_ms);
        if elapsed < self.interval_ms {
            return;
        }

        let intervals = elapsed / self.interval_ms;
        self.tokens = self
            .tokens
            .saturating_add(intervals.saturating_mul(self.capacity))
            .min(self.capacity);
        self.anchor_ms = self
            .anchor_ms
            .saturating_add(intervals.saturating_mul(self.interval_ms));
    }

    // == Try Take ==
    /// Consumes one token if available.
    pub fn try_take(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    // == Reset ==
    /// Restores the bucket to full and re-anchors it at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.tokens = self.capacity;
        self.anchor_ms = now_ms;
    }

    // == Accessors ==
    /// Currently available tokens.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Refill interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
