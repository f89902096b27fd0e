//! Queued Admission Module
//!
//! One-shot completion handles for callers parked on token availability.

use tokio::sync::oneshot;

use crate::error::RateLimitError;

/// Result delivered to a queued caller.
pub type AdmissionResult = Result<(), RateLimitError>;

// == Queued Admission ==
/// One caller blocked on token availability.
///
/// Owned by the limiter's queue for its lifetime and resolved exactly once:
/// granted when a token is assigned to it in FIFO order, or rejected when
/// the limiter is reset or disposed.
#[derive(Debug)]
pub struct QueuedAdmission {
    grant_tx: oneshot::Sender<AdmissionResult>,
}

impl QueuedAdmission {
    // == Constructor ==
    /// Creates an admission handle and the receiver its caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<AdmissionResult>) {
        let (grant_tx, grant_rx) = oneshot::channel();
        (Self { grant_tx }, grant_rx)
    }

    // == Grant ==
    /// Resolves the admission successfully.
    ///
    /// Returns false if the caller stopped waiting (dropped its receiver),
    /// in which case no token should be consumed for it.
    pub fn grant(self) -> bool {
        self.grant_tx.send(Ok(())).is_ok()
    }

    // == Reject ==
    /// Resolves the admission with a rate-limit error.
    pub fn reject(self, error: RateLimitError) {
        // A caller that already gave up cannot observe the rejection.
        let _ = self.grant_tx.send(Err(error));
    }
}
