use std::sync::Arc;

use tracing::info;

use crate::index::MemoryIndex;
use crate::store::{CacheStore, StoreError};

/// One-shot bootstrap: hydrate the memory index from the cache store so
/// usage counters survive a restart. Any failure here is recoverable; the
/// next catalog reload repopulates the index from the file.
pub struct CacheSyncer {
    store: Arc<dyn CacheStore>,
    index: Arc<MemoryIndex>,
}

impl CacheSyncer {
    pub fn new(store: Arc<dyn CacheStore>, index: Arc<MemoryIndex>) -> Self {
        Self { store, index }
    }

    pub async fn sync(&self) -> Result<(), StoreError> {
        info!("hydrating index from cache store");

        let services = self.store.get_all_services().await?;
        if services.is_empty() {
            info!("no services found in cache store");
        } else {
            info!(count = services.len(), "restored services from cache store");
            self.index.update_services(services);
        }

        let bookmarks = self.store.get_all_bookmarks().await?;
        if !bookmarks.is_empty() {
            info!(count = bookmarks.len(), "restored bookmarks from cache store");
            self.index.update_bookmarks(bookmarks);
        }

        Ok(())
    }
}
