//! Testing utilities.
//!
//! The in-memory cache store lets the resolver, schedulers, and the server
//! test suite exercise every cache-dependent path without a Redis server.

mod memory_store;

pub use memory_store::MemoryStore;
