//! Rate Limiter Module
//!
//! Token-bucket rate limiter with bounded FIFO queuing and a lazily managed
//! periodic drain task.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::error::RateLimitError;
use crate::limiter::admission::{AdmissionResult, QueuedAdmission};
use crate::limiter::bucket::TokenBucket;

// == Rate Limiter ==
/// Throttles callers to `max_requests` per `interval`.
///
/// Callers either take a token immediately, fail fast (queuing disabled or
/// queue full), or park in a FIFO queue until a refill grants them a token.
/// Mutable state lives behind a single mutex held only across the short
/// refill/drain/enqueue critical sections, never across the suspension
/// point of `acquire`.
#[derive(Debug)]
pub struct RateLimiter {
    inner: Arc<Mutex<LimiterInner>>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct LimiterInner {
    /// Token pool and refill arithmetic
    bucket: TokenBucket,
    /// Callers parked waiting for a token, in arrival order
    queue: VecDeque<QueuedAdmission>,
    /// Whether callers may queue at all
    queue_enabled: bool,
    /// Maximum number of queued callers
    max_queue_size: usize,
    /// Periodic drain task, present only while callers are queued
    drain_task: Option<JoinHandle<()>>,
    /// Set once `dispose` has run; the queued path then fails fast
    disposed: bool,
}

impl RateLimiter {
    // == Constructors ==
    /// Creates a rate limiter using the system clock.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a rate limiter with an injected clock.
    ///
    /// The clock drives refill arithmetic; the drain task's wakeup cadence
    /// still follows runtime time.
    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let now_ms = clock.now_ms();
        Self {
            inner: Arc::new(Mutex::new(LimiterInner {
                bucket: TokenBucket::new(config.max_requests, config.interval, now_ms),
                queue: VecDeque::new(),
                queue_enabled: config.queue,
                max_queue_size: config.max_queue_size,
                drain_task: None,
                disposed: false,
            })),
            clock,
        }
    }

    // == Acquire ==
    /// Acquires one admission token, suspending in the FIFO queue when none
    /// is available.
    ///
    /// Fails fast when queuing is disabled or the queue is full, and fails
    /// while suspended when the limiter is reset or disposed. No token is
    /// consumed on failure, and the call is never retried internally.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        let grant_rx = {
            let mut inner = self.inner.lock().await;
            inner.refill_and_drain(self.clock.now_ms());

            if inner.bucket.try_take() {
                return Ok(());
            }
            if inner.disposed {
                return Err(RateLimitError::LimiterDisposed);
            }
            if !inner.queue_enabled {
                return Err(RateLimitError::QueueDisabled);
            }
            if inner.queue.len() >= inner.max_queue_size {
                return Err(RateLimitError::QueueFull);
            }

            let (admission, grant_rx) = QueuedAdmission::channel();
            inner.queue.push_back(admission);
            debug!(queued = inner.queue.len(), "caller queued for admission");
            self.ensure_drain_task(&mut inner);
            grant_rx
        };

        // Suspended here with the lock released; resumes exactly once.
        await_grant(grant_rx).await
    }

    // == Try Acquire ==
    /// Consumes a token if one is available. Never suspends, never queues.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        inner.refill_and_drain(self.clock.now_ms());
        inner.bucket.try_take()
    }

    // == Introspection ==
    /// Refills, then reports the available token count.
    pub async fn available_tokens(&self) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.refill_and_drain(self.clock.now_ms());
        inner.bucket.tokens()
    }

    /// Reports the current queue length, without refilling.
    pub async fn queue_size(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    // == Reset ==
    /// Restores a full bucket, re-anchors the refill clock, stops the drain
    /// task and rejects every queued admission in FIFO order.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.stop_drain_task();
        inner.bucket.reset(self.clock.now_ms());
        let rejected = inner.reject_all(RateLimitError::LimiterReset);
        if rejected > 0 {
            debug!(rejected, "limiter reset rejected queued admissions");
        }
    }

    // == Dispose ==
    /// Resets the limiter and prevents any further queuing or periodic
    /// refill triggers. Idempotent.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.stop_drain_task();
        inner.bucket.reset(self.clock.now_ms());
        let rejected = inner.reject_all(RateLimitError::LimiterDisposed);
        if rejected > 0 {
            debug!(rejected, "limiter disposed with queued admissions");
        }
    }

    // == Drain Task ==
    /// Starts the periodic drain task if it is not already running.
    ///
    /// Once a caller is queued, nothing else would invoke refill unless
    /// another caller arrived, so a task parked on a periodic sleep keeps
    /// draining the queue. It holds only a weak reference, so a dropped
    /// limiter is never kept alive by its own timer, and it exits as soon
    /// as the queue is empty.
    fn ensure_drain_task(&self, inner: &mut LimiterInner) {
        let running = inner
            .drain_task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if running {
            return;
        }

        let weak: Weak<Mutex<LimiterInner>> = Arc::downgrade(&self.inner);
        let clock = Arc::clone(&self.clock);
        let period = inner.bucket.interval();

        inner.drain_task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;

                let Some(strong) = weak.upgrade() else { break };
                let mut inner = strong.lock().await;
                inner.refill_and_drain(clock.now_ms());
                if inner.queue.is_empty() {
                    inner.drain_task = None;
                    break;
                }
            }
        }));
    }
}

impl LimiterInner {
    /// Refills the bucket, then grants queued admissions in strict FIFO
    /// order while tokens remain.
    fn refill_and_drain(&mut self, now_ms: u64) {
        self.bucket.refill(now_ms);

        while self.bucket.tokens() > 0 {
            let Some(admission) = self.queue.pop_front() else { break };
            if admission.grant() {
                let _ = self.bucket.try_take();
                debug!(remaining = self.queue.len(), "queued admission granted");
            }
            // A caller that stopped waiting gives up its slot without
            // consuming a token.
        }
    }

    /// Rejects every queued admission in FIFO order. Returns how many.
    fn reject_all(&mut self, error: RateLimitError) -> usize {
        let mut rejected = 0;
        while let Some(admission) = self.queue.pop_front() {
            admission.reject(error.clone());
            rejected += 1;
        }
        rejected
    }

    /// Aborts the drain task if one is running.
    fn stop_drain_task(&mut self) {
        if let Some(handle) = self.drain_task.take() {
            handle.abort();
        }
    }
}

/// Awaits a queued admission's resolution.
///
/// A sender dropped without resolving means the limiter itself was dropped;
/// surface that the same way as disposal.
async fn await_grant(grant_rx: oneshot::Receiver<AdmissionResult>) -> Result<(), RateLimitError> {
    match grant_rx.await {
        Ok(result) => result,
        Err(_) => Err(RateLimitError::LimiterDisposed),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_err, assert_ok};

    fn config(
        max_requests: u64,
        interval_ms: u64,
        queue: bool,
        max_queue_size: usize,
    ) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            max_requests,
            interval: Duration::from_millis(interval_ms),
            queue,
            max_queue_size,
        }
    }

    #[tokio::test]
    async fn test_try_acquire_exhaustion_and_refill() {
        let limiter = RateLimiter::new(&config(3, 100, false, 0));

        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert!(!limiter.try_acquire().await);

        tokio::time::sleep(Duration::from_millis(110)).await;
        assert!(limiter.try_acquire().await);
    }

    #[tokio::test]
    async fn test_acquire_immediate_when_tokens_available() {
        let limiter = RateLimiter::new(&config(2, 100, true, 10));

        let start = Instant::now();
        assert_ok!(limiter.acquire().await);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_acquire_fails_fast_when_queue_disabled() {
        let limiter = RateLimiter::new(&config(1, 100, false, 0));

        assert_ok!(limiter.acquire().await);
        let err = assert_err!(limiter.acquire().await);
        assert_eq!(err, RateLimitError::QueueDisabled);
    }

    #[tokio::test]
    async fn test_queued_acquire_resolves_after_refill() {
        let limiter = RateLimiter::new(&config(1, 100, true, 1));

        assert_ok!(limiter.acquire().await);

        let start = Instant::now();
        assert_ok!(limiter.acquire().await);
        assert!(
            start.elapsed() >= Duration::from_millis(90),
            "queued caller resolved before a refill interval elapsed"
        );
    }

    #[tokio::test]
    async fn test_queue_full_fails_fast() {
        let limiter = Arc::new(RateLimiter::new(&config(1, 100, true, 1)));

        assert_ok!(limiter.acquire().await);

        // Park a second caller in the sole queue slot.
        let queued = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(limiter.queue_size().await, 1);

        // The queue is full; a third caller is rejected immediately.
        let start = Instant::now();
        let err = assert_err!(limiter.acquire().await);
        assert_eq!(err, RateLimitError::QueueFull);
        assert!(start.elapsed() < Duration::from_millis(50));

        assert_ok!(queued.await.unwrap());
    }

    #[tokio::test]
    async fn test_queued_admissions_grant_in_fifo_order() {
        let limiter = Arc::new(RateLimiter::new(&config(1, 50, true, 10)));
        let order = Arc::new(Mutex::new(Vec::new()));

        assert_ok!(limiter.acquire().await);

        let mut handles = Vec::new();
        for id in 0..3 {
            let limiter = Arc::clone(&limiter);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await.unwrap();
                order.lock().await.push(id);
            }));
            // Make arrival order deterministic.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reset_rejects_all_queued_callers() {
        let limiter = Arc::new(RateLimiter::new(&config(1, 60_000, true, 10)));

        assert_ok!(limiter.acquire().await);

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(limiter.queue_size().await, 3);

        limiter.reset().await;

        for handle in handles {
            let err = assert_err!(handle.await.unwrap());
            assert_eq!(err, RateLimitError::LimiterReset);
        }
        assert_eq!(limiter.queue_size().await, 0);

        // Reset refilled the bucket.
        assert_eq!(limiter.available_tokens().await, 1);
    }

    #[tokio::test]
    async fn test_dispose_rejects_queued_and_is_idempotent() {
        let limiter = Arc::new(RateLimiter::new(&config(1, 60_000, true, 10)));

        assert_ok!(limiter.acquire().await);

        let queued = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        limiter.dispose().await;
        let err = assert_err!(queued.await.unwrap());
        assert_eq!(err, RateLimitError::LimiterDisposed);

        // Second dispose has no further observable effect.
        limiter.dispose().await;
        assert_eq!(limiter.queue_size().await, 0);
    }

    #[tokio::test]
    async fn test_acquire_after_dispose_fails_fast_once_empty() {
        let limiter = RateLimiter::new(&config(1, 60_000, true, 10));

        limiter.dispose().await;

        // Residual tokens still grant immediately.
        assert_ok!(limiter.acquire().await);

        // With no timer allowed, the queued path fails fast instead.
        let start = Instant::now();
        let err = assert_err!(limiter.acquire().await);
        assert_eq!(err, RateLimitError::LimiterDisposed);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_available_tokens_refills_first() {
        let limiter = RateLimiter::new(&config(2, 100, false, 0));

        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert_eq!(limiter.available_tokens().await, 0);

        tokio::time::sleep(Duration::from_millis(110)).await;
        assert_eq!(limiter.available_tokens().await, 2);
    }

    #[tokio::test]
    async fn test_no_token_is_consumed_on_failure() {
        let limiter = RateLimiter::new(&config(2, 60_000, false, 0));

        assert!(limiter.try_acquire().await);
        assert!(limiter.try_acquire().await);
        assert_err!(limiter.acquire().await);
        assert_err!(limiter.acquire().await);

        // Failures above consumed nothing; a reset proves the pool intact.
        limiter.reset().await;
        assert_eq!(limiter.available_tokens().await, 2);
    }
}
