//! In-memory cache store for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Bookmark, Service};
use crate::store::{CacheStore, StoreError};

/// In-memory implementation of [`CacheStore`].
///
/// TTLs are accepted and ignored. The store can be switched into an
/// "unavailable" mode where every operation fails, to exercise the
/// degraded-cache paths without a Redis server.
#[derive(Default)]
pub struct MemoryStore {
    resolutions: Arc<RwLock<HashMap<String, String>>>,
    services: Arc<RwLock<HashMap<String, Service>>>,
    bookmarks: Arc<RwLock<HashMap<String, Bookmark>>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(())
    }

    /// Current resolution cache contents, for assertions.
    pub async fn resolutions(&self) -> HashMap<String, String> {
        self.resolutions.read().await.clone()
    }

    /// Seed a cached resolution without going through the trait.
    pub async fn seed_resolution(&self, query: &str, hostname: &str) {
        self.resolutions
            .write()
            .await
            .insert(query.to_string(), hostname.to_string());
    }

    pub async fn service_count(&self) -> usize {
        self.services.read().await.len()
    }

    pub async fn bookmark_count(&self) -> usize {
        self.bookmarks.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn cache_resolution(
        &self,
        query: &str,
        hostname: &str,
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.resolutions
            .write()
            .await
            .insert(query.to_string(), hostname.to_string());
        Ok(())
    }

    async fn cached_resolution(&self, query: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.resolutions.read().await.get(query).cloned())
    }

    async fn invalidate_cache(&self, query: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.resolutions.write().await.remove(query);
        Ok(())
    }

    async fn flush_cache(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut resolutions = self.resolutions.write().await;
        let count = resolutions.len() as u64;
        resolutions.clear();
        Ok(count)
    }

    async fn save_service(&self, service: &Service) -> Result<(), StoreError> {
        self.check_available()?;
        self.services
            .write()
            .await
            .insert(service.id.clone(), service.clone());
        Ok(())
    }

    async fn get_service(&self, id: &str) -> Result<Service, StoreError> {
        self.check_available()?;
        self.services
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_all_services(&self) -> Result<Vec<Service>, StoreError> {
        self.check_available()?;
        Ok(self.services.read().await.values().cloned().collect())
    }

    async fn delete_service(&self, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.services.write().await.remove(id);
        Ok(())
    }

    async fn save_services_many(&self, services: &[Service]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut map = self.services.write().await;
        for service in services {
            map.insert(service.id.clone(), service.clone());
        }
        Ok(())
    }

    async fn update_service_counter(&self, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let now = Utc::now();
        let mut map = self.services.write().await;
        let service = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        service.counter += 1;
        service.last_seen_at = Some(now);
        service.last_used_at = Some(now);
        Ok(())
    }

    async fn save_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        self.check_available()?;
        self.bookmarks
            .write()
            .await
            .insert(bookmark.id.clone(), bookmark.clone());
        Ok(())
    }

    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, StoreError> {
        self.check_available()?;
        self.bookmarks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn get_all_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        self.check_available()?;
        Ok(self.bookmarks.read().await.values().cloned().collect())
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.bookmarks.write().await.remove(id);
        Ok(())
    }

    async fn save_bookmarks_many(&self, bookmarks: &[Bookmark]) -> Result<(), StoreError> {
        self.check_available()?;
        let mut map = self.bookmarks.write().await;
        for bookmark in bookmarks {
            map.insert(bookmark.id.clone(), bookmark.clone());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
