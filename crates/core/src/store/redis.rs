//! Redis-backed implementation of the cache store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::{Bookmark, Service};

use super::keys::{bookmark_key, cache_key, service_key, KEY_ALL_BOOKMARKS, KEY_ALL_SERVICES};
use super::{CacheStore, StoreError, DEFAULT_ENTRY_TTL};

/// Cache store speaking to a Redis server through a pooled, reconnecting
/// connection manager. Cloning is cheap; the manager is shared.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    entry_ttl_secs: u64,
}

impl RedisStore {
    /// Connect to the Redis server at `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str, entry_ttl: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            entry_ttl_secs: entry_ttl.as_secs().max(1),
        })
    }

    /// Connect with the default 48h record TTL.
    pub async fn connect_default(url: &str) -> Result<Self, StoreError> {
        Self::connect(url, DEFAULT_ENTRY_TTL).await
    }
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn serialization(e: serde_json::Error) -> StoreError {
    StoreError::Serialization(e.to_string())
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn cache_resolution(
        &self,
        query: &str,
        hostname: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(cache_key(query), hostname, ttl.as_secs().max(1))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn cached_resolution(&self, query: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let hostname: Option<String> = conn.get(cache_key(query)).await.map_err(backend)?;
        Ok(hostname.filter(|h| !h.is_empty()))
    }

    async fn invalidate_cache(&self, query: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(cache_key(query)).await.map_err(backend)?;
        Ok(())
    }

    async fn flush_cache(&self) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", super::KEY_PREFIX_CACHE);
        let keys: Vec<String> = {
            let mut iter: redis::AsyncIter<String> =
                conn.scan_match(&pattern).await.map_err(backend)?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }
        let deleted: u64 = conn.del(&keys).await.map_err(backend)?;
        Ok(deleted)
    }

    async fn save_service(&self, service: &Service) -> Result<(), StoreError> {
        let data = serde_json::to_string(service).map_err(serialization)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(service_key(&service.id), data, self.entry_ttl_secs)
            .await
            .map_err(backend)?;
        let _: () = conn
            .sadd(KEY_ALL_SERVICES, &service.id)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_service(&self, id: &str) -> Result<Service, StoreError> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(service_key(id)).await.map_err(backend)?;
        let data = data.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        serde_json::from_str(&data).map_err(serialization)
    }

    async fn get_all_services(&self) -> Result<Vec<Service>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(KEY_ALL_SERVICES).await.map_err(backend)?;

        let mut services = Vec::with_capacity(ids.len());
        for id in ids {
            // Records can expire before their set membership does.
            match self.get_service(&id).await {
                Ok(service) => services.push(service),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(services)
    }

    async fn delete_service(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(service_key(id)).await.map_err(backend)?;
        let _: () = conn.srem(KEY_ALL_SERVICES, id).await.map_err(backend)?;
        Ok(())
    }

    async fn save_services_many(&self, services: &[Service]) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        for service in services {
            let data = serde_json::to_string(service).map_err(serialization)?;
            pipe.set_ex(service_key(&service.id), data, self.entry_ttl_secs)
                .ignore()
                .sadd(KEY_ALL_SERVICES, &service.id)
                .ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_service_counter(&self, id: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut service = self.get_service(id).await?;
        service.counter += 1;
        service.last_seen_at = Some(now);
        service.last_used_at = Some(now);
        self.save_service(&service).await
    }

    async fn save_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        let data = serde_json::to_string(bookmark).map_err(serialization)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(bookmark_key(&bookmark.id), data, self.entry_ttl_secs)
            .await
            .map_err(backend)?;
        let _: () = conn
            .sadd(KEY_ALL_BOOKMARKS, &bookmark.id)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_bookmark(&self, id: &str) -> Result<Bookmark, StoreError> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(bookmark_key(id)).await.map_err(backend)?;
        let data = data.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        serde_json::from_str(&data).map_err(serialization)
    }

    async fn get_all_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(KEY_ALL_BOOKMARKS).await.map_err(backend)?;

        let mut bookmarks = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_bookmark(&id).await {
                Ok(bookmark) => bookmarks.push(bookmark),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(bookmarks)
    }

    async fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(bookmark_key(id)).await.map_err(backend)?;
        let _: () = conn.srem(KEY_ALL_BOOKMARKS, id).await.map_err(backend)?;
        Ok(())
    }

    async fn save_bookmarks_many(&self, bookmarks: &[Bookmark]) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        for bookmark in bookmarks {
            let data = serde_json::to_string(bookmark).map_err(serialization)?;
            pipe.set_ex(bookmark_key(&bookmark.id), data, self.entry_ttl_secs)
                .ignore()
                .sadd(KEY_ALL_BOOKMARKS, &bookmark.id)
                .ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
