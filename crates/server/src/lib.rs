//! HTTP layer for the jump redirection service.
//!
//! Exposed as a library so the end-to-end tests can drive the real router
//! in-process.

pub mod api;
pub mod metrics;
pub mod state;
