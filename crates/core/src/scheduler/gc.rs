use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::index::MemoryIndex;
use crate::store::CacheStore;

/// Counts from one garbage collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcReport {
    pub services_deleted: usize,
    pub bookmarks_deleted: usize,
}

impl GcReport {
    pub fn total(&self) -> usize {
        self.services_deleted + self.bookmarks_deleted
    }
}

/// Hard-deletes entries whose soft-delete age exceeds the threshold.
pub struct GarbageCollector {
    store: Option<Arc<dyn CacheStore>>,
    index: Arc<MemoryIndex>,
    interval: Duration,
    threshold: Duration,
}

impl GarbageCollector {
    pub fn new(
        store: Option<Arc<dyn CacheStore>>,
        index: Arc<MemoryIndex>,
        interval: Duration,
        threshold: Duration,
    ) -> Self {
        Self {
            store,
            index,
            interval,
            threshold,
        }
    }

    /// Collect once immediately, then on every tick until shutdown.
    pub fn spawn(self, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval = ?self.interval, threshold = ?self.threshold, "garbage collector started");

            self.collect().await;

            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.collect().await;
                    }
                    _ = shutdown.recv() => break,
                }
            }

            info!("garbage collector stopped");
        })
    }

    /// Run one collection pass over services and bookmarks.
    pub async fn collect(&self) -> GcReport {
        let now = Utc::now();
        let report = GcReport {
            services_deleted: self.collect_services(now).await,
            bookmarks_deleted: self.collect_bookmarks(now).await,
        };

        if report.total() > 0 {
            info!(
                services_deleted = report.services_deleted,
                bookmarks_deleted = report.bookmarks_deleted,
                total_deleted = report.total(),
                "garbage collection completed"
            );
        } else {
            debug!("no entries to garbage collect");
        }

        report
    }

    async fn collect_services(&self, now: DateTime<Utc>) -> usize {
        let mut deleted = 0;

        for service in self.index.all_services() {
            if !service.disabled {
                continue;
            }
            let Some(disabled_for) = age(now, service.updated_at) else {
                continue;
            };
            if disabled_for < self.threshold {
                continue;
            }

            self.index.delete_service(&service.id);

            if let Some(store) = &self.store {
                if let Err(e) = store.delete_service(&service.id).await {
                    warn!(service_id = %service.id, error = %e, "failed to delete service from cache store");
                }
            }

            info!(
                service_id = %service.id,
                hostname = %service.hostname,
                disabled_for = ?disabled_for,
                "garbage collected disabled service"
            );
            deleted += 1;
        }

        deleted
    }

    async fn collect_bookmarks(&self, now: DateTime<Utc>) -> usize {
        let mut deleted = 0;

        for bookmark in self.index.all_bookmarks() {
            if !bookmark.disabled {
                continue;
            }
            let Some(disabled_for) = age(now, bookmark.updated_at) else {
                continue;
            };
            if disabled_for < self.threshold {
                continue;
            }

            self.index.delete_bookmark(&bookmark.id);

            if let Some(store) = &self.store {
                if let Err(e) = store.delete_bookmark(&bookmark.id).await {
                    warn!(bookmark_id = %bookmark.id, error = %e, "failed to delete bookmark from cache store");
                }
            }

            info!(
                bookmark_id = %bookmark.id,
                abbr = %bookmark.abbr,
                disabled_for = ?disabled_for,
                "garbage collected disabled bookmark"
            );
            deleted += 1;
        }

        deleted
    }
}

/// Age of an entry since `updated_at`. Entries with no timestamp, or a
/// timestamp in the future, never age out.
fn age(now: DateTime<Utc>, updated_at: Option<DateTime<Utc>>) -> Option<Duration> {
    let updated_at = updated_at?;
    now.signed_duration_since(updated_at).to_std().ok()
}
