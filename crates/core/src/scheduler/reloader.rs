use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{Bookmark, Service};
use crate::index::MemoryIndex;
use crate::source::{map_bookmarks, map_services, BookmarkLoader, ServiceLoader, SourceError};
use crate::store::CacheStore;

/// Periodically reloads services from the catalog file.
///
/// Entries that disappeared from the file are soft-deleted rather than
/// dropped: they stay in the index, invisible to ranking, until the
/// garbage collector ages them out.
pub struct ServiceReloader {
    loader: ServiceLoader,
    store: Option<Arc<dyn CacheStore>>,
    index: Arc<MemoryIndex>,
    interval: Duration,
}

impl ServiceReloader {
    pub fn new(
        service_file: impl Into<PathBuf>,
        store: Option<Arc<dyn CacheStore>>,
        index: Arc<MemoryIndex>,
        interval: Duration,
    ) -> Self {
        Self {
            loader: ServiceLoader::new(service_file),
            store,
            index,
            interval,
        }
    }

    /// Reload immediately, then keep reloading on every tick or manual
    /// trigger until shutdown.
    pub fn spawn(
        self,
        mut trigger: mpsc::Receiver<()>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval = ?self.interval, "service reloader started");

            if let Err(e) = self.reload().await {
                error!(error = %e, "initial service reload failed, keeping empty index");
            }

            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reload().await {
                            error!(error = %e, "service reload failed, keeping previous index");
                        }
                    }
                    Some(()) = trigger.recv() => {
                        info!("manual service reload triggered");
                        if let Err(e) = self.reload().await {
                            error!(error = %e, "service reload failed, keeping previous index");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }

            info!("service reloader stopped");
        })
    }

    /// Load the catalog file, diff against the index, and replace.
    pub async fn reload(&self) -> Result<(), SourceError> {
        info!("reloading services from catalog");

        let config = self.loader.load()?;
        let mut new_services = map_services(&config)?;
        info!(count = new_services.len(), "loaded services from catalog");

        let disabled = diff_missing_services(&self.index, &new_services);
        if !disabled.is_empty() {
            info!(count = disabled.len(), "soft-deleting removed services");
        }
        new_services.extend(disabled);

        self.index.update_services(new_services.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store.save_services_many(&new_services).await {
                // The index stays authoritative; the store catches up later.
                warn!(error = %e, "failed to write services to cache store");
            }
        }

        Ok(())
    }
}

/// Catalog-sourced index entries missing from the new list, marked as
/// soft-deleted. Entries that were already disabled keep their original
/// `updated_at` so the garbage collection clock keeps running.
fn diff_missing_services(index: &MemoryIndex, new_services: &[Service]) -> Vec<Service> {
    let now = Utc::now();
    let new_ids: std::collections::HashSet<&str> =
        new_services.iter().map(|s| s.id.as_str()).collect();
    index
        .all_services()
        .into_iter()
        .filter(|existing| existing.has_source("catalog"))
        .filter(|existing| !new_ids.contains(existing.id.as_str()))
        .map(|mut missing| {
            if !missing.disabled {
                missing.disabled = true;
                missing.updated_at = Some(now);
            }
            missing
        })
        .collect()
}

/// Periodically reloads bookmarks from the catalog file. Same lifecycle as
/// [`ServiceReloader`].
pub struct BookmarkReloader {
    loader: BookmarkLoader,
    store: Option<Arc<dyn CacheStore>>,
    index: Arc<MemoryIndex>,
    interval: Duration,
}

impl BookmarkReloader {
    pub fn new(
        bookmark_file: impl Into<PathBuf>,
        store: Option<Arc<dyn CacheStore>>,
        index: Arc<MemoryIndex>,
        interval: Duration,
    ) -> Self {
        Self {
            loader: BookmarkLoader::new(bookmark_file),
            store,
            index,
            interval,
        }
    }

    pub fn spawn(
        self,
        mut trigger: mpsc::Receiver<()>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval = ?self.interval, "bookmark reloader started");

            if let Err(e) = self.reload().await {
                error!(error = %e, "initial bookmark reload failed");
            }

            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reload().await {
                            error!(error = %e, "bookmark reload failed, keeping previous index");
                        }
                    }
                    Some(()) = trigger.recv() => {
                        info!("manual bookmark reload triggered");
                        if let Err(e) = self.reload().await {
                            error!(error = %e, "bookmark reload failed, keeping previous index");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }

            info!("bookmark reloader stopped");
        })
    }

    pub async fn reload(&self) -> Result<(), SourceError> {
        info!("reloading bookmarks from catalog");

        let config = self.loader.load()?;
        let mut new_bookmarks = map_bookmarks(&config)?;
        info!(count = new_bookmarks.len(), "loaded bookmarks from catalog");

        let disabled = diff_missing_bookmarks(&self.index, &new_bookmarks);
        if !disabled.is_empty() {
            info!(count = disabled.len(), "soft-deleting removed bookmarks");
        }
        new_bookmarks.extend(disabled);

        self.index.update_bookmarks(new_bookmarks.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store.save_bookmarks_many(&new_bookmarks).await {
                warn!(error = %e, "failed to write bookmarks to cache store");
            }
        }

        Ok(())
    }
}

fn diff_missing_bookmarks(index: &MemoryIndex, new_bookmarks: &[Bookmark]) -> Vec<Bookmark> {
    let now = Utc::now();
    let new_ids: std::collections::HashSet<&str> =
        new_bookmarks.iter().map(|b| b.id.as_str()).collect();
    index
        .all_bookmarks()
        .into_iter()
        .filter(|existing| existing.sources.iter().any(|s| s == "catalog"))
        .filter(|existing| !new_ids.contains(existing.id.as_str()))
        .map(|mut missing| {
            if !missing.disabled {
                missing.disabled = true;
                missing.updated_at = Some(now);
            }
            missing
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn services_yaml(hosts: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "- Group:").unwrap();
        for host in hosts {
            let name = host.split('.').next().unwrap();
            writeln!(file, "    - {name}:\n        href: https://{host}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn reloader(
        file: &NamedTempFile,
        index: Arc<MemoryIndex>,
        store: Option<Arc<MemoryStore>>,
    ) -> ServiceReloader {
        let store = store.map(|s| s as Arc<dyn CacheStore>);
        ServiceReloader::new(file.path(), store, index, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn reload_populates_index_and_store() {
        let file = services_yaml(&["jellyfin.example.com", "adguard.example.com"]);
        let index = Arc::new(MemoryIndex::new());
        let store = Arc::new(MemoryStore::new());
        let r = reloader(&file, Arc::clone(&index), Some(Arc::clone(&store)));

        r.reload().await.unwrap();

        assert_eq!(index.service_count(), 2);
        assert_eq!(store.service_count().await, 2);
        assert!(index.last_services_reload().is_some());
    }

    #[tokio::test]
    async fn removed_entries_are_soft_deleted_not_dropped() {
        let file = services_yaml(&["jellyfin.example.com", "adguard.example.com"]);
        let index = Arc::new(MemoryIndex::new());
        let r = reloader(&file, Arc::clone(&index), None);
        r.reload().await.unwrap();

        let file = services_yaml(&["jellyfin.example.com"]);
        let r = reloader(&file, Arc::clone(&index), None);
        r.reload().await.unwrap();

        assert_eq!(index.service_count(), 2);
        let gone = index.get_service("adguard.example.com").unwrap();
        assert!(gone.disabled);
        assert!(gone.updated_at.is_some());
        let kept = index.get_service("jellyfin.example.com").unwrap();
        assert!(!kept.disabled);
    }

    #[tokio::test]
    async fn reappearing_entry_is_re_enabled() {
        let both = services_yaml(&["jellyfin.example.com", "adguard.example.com"]);
        let only_one = services_yaml(&["jellyfin.example.com"]);
        let index = Arc::new(MemoryIndex::new());

        let r = reloader(&both, Arc::clone(&index), None);
        r.reload().await.unwrap();
        let r = reloader(&only_one, Arc::clone(&index), None);
        r.reload().await.unwrap();
        let r = reloader(&both, Arc::clone(&index), None);
        r.reload().await.unwrap();

        assert!(!index.get_service("adguard.example.com").unwrap().disabled);
    }

    #[tokio::test]
    async fn re_disabling_keeps_the_original_soft_delete_time() {
        let both = services_yaml(&["jellyfin.example.com", "adguard.example.com"]);
        let only_one = services_yaml(&["jellyfin.example.com"]);
        let index = Arc::new(MemoryIndex::new());

        let r = reloader(&both, Arc::clone(&index), None);
        r.reload().await.unwrap();
        let r = reloader(&only_one, Arc::clone(&index), None);
        r.reload().await.unwrap();
        let first = index.get_service("adguard.example.com").unwrap().updated_at;

        let r = reloader(&only_one, Arc::clone(&index), None);
        r.reload().await.unwrap();
        let second = index.get_service("adguard.example.com").unwrap().updated_at;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn load_failure_keeps_previous_index() {
        let file = services_yaml(&["jellyfin.example.com"]);
        let index = Arc::new(MemoryIndex::new());
        let r = reloader(&file, Arc::clone(&index), None);
        r.reload().await.unwrap();

        let broken = ServiceReloader::new(
            "/nonexistent/services.yaml",
            None,
            Arc::clone(&index),
            Duration::from_secs(3600),
        );

        assert!(broken.reload().await.is_err());
        assert_eq!(index.service_count(), 1);
    }

    #[tokio::test]
    async fn store_outage_does_not_fail_the_reload() {
        let file = services_yaml(&["jellyfin.example.com"]);
        let index = Arc::new(MemoryIndex::new());
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);

        let r = reloader(&file, Arc::clone(&index), Some(store));
        r.reload().await.unwrap();
        assert_eq!(index.service_count(), 1);
    }

    #[tokio::test]
    async fn manual_trigger_coalesces() {
        let (tx, _rx) = mpsc::channel::<()>(1);
        assert!(tx.try_send(()).is_ok());
        // Second signal finds the slot occupied and is dropped.
        assert!(tx.try_send(()).is_err());
    }

    fn bookmarks_yaml(entries: &[(&str, &str)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "- Category:").unwrap();
        for (abbr, url) in entries {
            writeln!(
                file,
                "    - {abbr}:\n        - abbr: {abbr}\n          href: {url}"
            )
            .unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn bookmark_reload_soft_deletes_like_services() {
        let index = Arc::new(MemoryIndex::new());
        let both = bookmarks_yaml(&[
            ("ChatGPT", "https://chat.openai.com/"),
            ("DockerHub", "https://hub.docker.com/"),
        ]);
        let one = bookmarks_yaml(&[("ChatGPT", "https://chat.openai.com/")]);

        let r = BookmarkReloader::new(
            both.path(),
            None,
            Arc::clone(&index),
            Duration::from_secs(3600),
        );
        r.reload().await.unwrap();
        assert_eq!(index.bookmark_count(), 2);

        let r = BookmarkReloader::new(
            one.path(),
            None,
            Arc::clone(&index),
            Duration::from_secs(3600),
        );
        r.reload().await.unwrap();

        assert_eq!(index.bookmark_count(), 2);
        let disabled: Vec<_> = index
            .all_bookmarks()
            .into_iter()
            .filter(|b| b.disabled)
            .collect();
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].url, "https://hub.docker.com/");
    }
}
