use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::domain::{Bookmark, Service};

/// In-memory storage and lookup for services and bookmarks.
///
/// This is the authoritative catalog: the cache store is only an
/// accelerator, and on any conflict the index wins. Services and bookmarks
/// live behind independent locks so reloading one never blocks the other.
/// Snapshots returned by the `all_*` methods are owned clones; counter
/// updates must go through [`MemoryIndex::increment_counter`].
#[derive(Debug, Default)]
pub struct MemoryIndex {
    services: RwLock<Shard<Service>>,
    bookmarks: RwLock<Shard<Bookmark>>,
}

#[derive(Debug)]
struct Shard<T> {
    entries: HashMap<String, T>,
    last_reload: Option<DateTime<Utc>>,
}

impl<T> Default for Shard<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            last_reload: None,
        }
    }
}

// Lock poisoning can only happen if a panic escapes while holding a guard;
// none of the operations below can panic mid-update, so recovering the
// inner value keeps the index usable either way.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace all services. Readers observe either the previous
    /// map or the new one, never a mixture.
    pub fn update_services(&self, services: Vec<Service>) {
        let mut shard = write(&self.services);
        shard.entries = services.into_iter().map(|s| (s.id.clone(), s)).collect();
        shard.last_reload = Some(Utc::now());
    }

    pub fn get_service(&self, id: &str) -> Option<Service> {
        read(&self.services).entries.get(id).cloned()
    }

    /// Snapshot of all services, ordered by id so ranking ties resolve the
    /// same way on every call. The returned entries are read-only copies;
    /// mutations go through the index methods.
    pub fn all_services(&self) -> Vec<Service> {
        let mut services: Vec<Service> = read(&self.services).entries.values().cloned().collect();
        services.sort_by(|a, b| a.id.cmp(&b.id));
        services
    }

    pub fn add_service(&self, service: Service) {
        write(&self.services)
            .entries
            .insert(service.id.clone(), service);
    }

    pub fn delete_service(&self, id: &str) {
        write(&self.services).entries.remove(id);
    }

    pub fn service_count(&self) -> usize {
        read(&self.services).entries.len()
    }

    /// Bump the usage counter for a service. No-op when the id is absent.
    /// `last_used_at` is the resolver's concern, not the index's.
    pub fn increment_counter(&self, id: &str) {
        if let Some(service) = write(&self.services).entries.get_mut(id) {
            service.counter += 1;
        }
    }

    pub fn last_services_reload(&self) -> Option<DateTime<Utc>> {
        read(&self.services).last_reload
    }

    /// Atomically replace all bookmarks.
    pub fn update_bookmarks(&self, bookmarks: Vec<Bookmark>) {
        let mut shard = write(&self.bookmarks);
        shard.entries = bookmarks.into_iter().map(|b| (b.id.clone(), b)).collect();
        shard.last_reload = Some(Utc::now());
    }

    pub fn get_bookmark(&self, id: &str) -> Option<Bookmark> {
        read(&self.bookmarks).entries.get(id).cloned()
    }

    /// Snapshot of all bookmarks, ordered by id.
    pub fn all_bookmarks(&self) -> Vec<Bookmark> {
        let mut bookmarks: Vec<Bookmark> =
            read(&self.bookmarks).entries.values().cloned().collect();
        bookmarks.sort_by(|a, b| a.id.cmp(&b.id));
        bookmarks
    }

    pub fn add_bookmark(&self, bookmark: Bookmark) {
        write(&self.bookmarks)
            .entries
            .insert(bookmark.id.clone(), bookmark);
    }

    pub fn delete_bookmark(&self, id: &str) {
        write(&self.bookmarks).entries.remove(id);
    }

    pub fn bookmark_count(&self) -> usize {
        read(&self.bookmarks).entries.len()
    }

    pub fn last_bookmarks_reload(&self) -> Option<DateTime<Utc>> {
        read(&self.bookmarks).last_reload
    }
}
