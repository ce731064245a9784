//! External key/value cache store.
//!
//! The store accelerates the hot path (query → hostname short-circuit) and
//! persists usage counters across restarts. It is never the source of
//! truth: on any conflict with the memory index, the index wins, and every
//! operation is best-effort from the resolver's point of view.

mod keys;
mod redis;

pub use keys::{
    bookmark_key, cache_key, service_key, KEY_ALL_BOOKMARKS, KEY_ALL_SERVICES,
    KEY_PREFIX_BOOKMARK, KEY_PREFIX_CACHE, KEY_PREFIX_SERVICE,
};
pub use redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Bookmark, Service};

/// Default TTL for service and bookmark records (48 hours).
pub const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(48 * 60 * 60);

/// Default TTL for cached resolutions (24 hours).
pub const DEFAULT_RESOLUTION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Cache store operations.
///
/// This is the one seam in the system behind a trait: production uses
/// [`RedisStore`], tests use the in-memory store from `crate::testing`.
/// A cache miss on `cached_resolution` is `Ok(None)`, not an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Remember that `query` resolved to `hostname`.
    async fn cache_resolution(
        &self,
        query: &str,
        hostname: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Look up a previously cached resolution.
    async fn cached_resolution(&self, query: &str) -> Result<Option<String>, StoreError>;

    /// Drop the cached resolution for `query`.
    async fn invalidate_cache(&self, query: &str) -> Result<(), StoreError>;

    /// Drop every cached resolution. Returns the number of keys removed.
    async fn flush_cache(&self) -> Result<u64, StoreError>;

    async fn save_service(&self, service: &Service) -> Result<(), StoreError>;
    async fn get_service(&self, id: &str) -> Result<Service, StoreError>;
    async fn get_all_services(&self) -> Result<Vec<Service>, StoreError>;
    async fn delete_service(&self, id: &str) -> Result<(), StoreError>;

    /// Pipelined bulk write of service records.
    async fn save_services_many(&self, services: &[Service]) -> Result<(), StoreError>;

    /// Read-modify-write counter bump after a validated redirect, also
    /// refreshing `last_seen_at` and `last_used_at`.
    async fn update_service_counter(&self, id: &str) -> Result<(), StoreError>;

    async fn save_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError>;
    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, StoreError>;
    async fn get_all_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError>;
    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError>;

    /// Pipelined bulk write of bookmark records.
    async fn save_bookmarks_many(&self, bookmarks: &[Bookmark]) -> Result<(), StoreError>;

    /// Liveness check for the backing store.
    async fn ping(&self) -> Result<(), StoreError>;
}
