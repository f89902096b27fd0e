//! Models Module
//!
//! Response DTOs for the gateway API.

pub mod responses;

pub use responses::*;
