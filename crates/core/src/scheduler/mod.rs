//! Background reconciliation: periodic catalog reloads, soft-delete
//! garbage collection, and the one-shot bootstrap sync from the cache
//! store.
//!
//! Every loop runs as a spawned task selecting over its tick source, its
//! manual trigger channel (reloaders only), and the process-wide shutdown
//! broadcast. Per-iteration errors are logged and swallowed; the loops
//! never die on their own.

mod gc;
mod reloader;
mod sync;

pub use gc::{GarbageCollector, GcReport};
pub use reloader::{BookmarkReloader, ServiceReloader};
pub use sync::CacheSyncer;
