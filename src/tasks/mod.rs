//! Background Tasks Module
//!
//! Optional periodic maintenance tasks for the gateway binary.

pub mod prune;

pub use prune::spawn_prune_task;
