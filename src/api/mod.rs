//! API Module
//!
//! HTTP handlers and routing for the gateway REST API.
//!
//! # Endpoints
//! - `GET /fetch/*path` - Gated fetch of an upstream resource
//! - `DELETE /cache/:key` - Remove a single cache entry
//! - `POST /cache/prune` - Eagerly sweep expired entries
//! - `POST /cache/clear` - Remove all cache entries
//! - `GET /stats` - Cache counters and limiter occupancy
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
