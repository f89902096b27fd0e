//! Error types for the gated cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Rate Limit Error Enum ==
/// A rejected admission. One error kind, with a distinct reason per
/// rejection path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// No token was available and queuing is disabled
    #[error("Rate limit exceeded: queuing is disabled")]
    QueueDisabled,

    /// No token was available and the admission queue is full
    #[error("Rate limit exceeded: admission queue is full")]
    QueueFull,

    /// The limiter was reset while this caller was queued
    #[error("Rate limit exceeded: limiter was reset")]
    LimiterReset,

    /// The limiter was disposed; queued admissions can no longer be granted
    #[error("Rate limit exceeded: limiter was disposed")]
    LimiterDisposed,
}

// == Gate Error Enum ==
/// Error surfaced by a gated fetch: either an admission rejection or the
/// producer's own error, passed through unmodified.
#[derive(Error, Debug)]
pub enum GateError<E> {
    /// The rate limiter rejected the call before the producer ran
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// The upstream producer failed; nothing was cached
    #[error(transparent)]
    Producer(E),
}

impl<E> GateError<E> {
    /// Returns true if this error is an admission rejection.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GateError::RateLimit(_))
    }
}

// == IntoResponse Implementations ==
impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (StatusCode::TOO_MANY_REQUESTS, body).into_response()
    }
}

impl IntoResponse for GateError<reqwest::Error> {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GateError::RateLimit(err) => (StatusCode::TOO_MANY_REQUESTS, err.to_string()),
            GateError::Producer(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for gated fetch operations.
pub type GateResult<T, E> = std::result::Result<T, GateError<E>>;
