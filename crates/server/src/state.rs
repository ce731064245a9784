use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use jump_core::store::CacheStore;
use jump_core::{Config, MemoryIndex, Resolver};

/// Shared application state
pub struct AppState {
    config: Config,
    index: Arc<MemoryIndex>,
    store: Option<Arc<dyn CacheStore>>,
    resolver: Resolver,
    reload_trigger: mpsc::Sender<()>,
    bookmark_reload_trigger: Option<mpsc::Sender<()>>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        index: Arc<MemoryIndex>,
        store: Option<Arc<dyn CacheStore>>,
        resolver: Resolver,
        reload_trigger: mpsc::Sender<()>,
        bookmark_reload_trigger: Option<mpsc::Sender<()>>,
    ) -> Self {
        Self {
            config,
            index,
            store,
            resolver,
            reload_trigger,
            bookmark_reload_trigger,
            started_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &Arc<MemoryIndex> {
        &self.index
    }

    /// The cache store, if one is connected.
    pub fn store(&self) -> Option<&Arc<dyn CacheStore>> {
        self.store.as_ref()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Manual trigger channel for the service reloader.
    pub fn reload_trigger(&self) -> &mpsc::Sender<()> {
        &self.reload_trigger
    }

    /// Manual trigger channel for the bookmark reloader (if enabled).
    pub fn bookmark_reload_trigger(&self) -> Option<&mpsc::Sender<()>> {
        self.bookmark_reload_trigger.as_ref()
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
