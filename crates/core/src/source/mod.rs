//! Declarative catalog ingestion.
//!
//! The catalog is authored for a dashboard tool: grouped services with an
//! `href`, and categorized bookmarks with an `abbr` and `href`. The loader
//! reads and parses the files, the mappers normalize entries into domain
//! types.

mod loader;
mod mapper;
mod schema;

pub use loader::{BookmarkLoader, ServiceLoader};
pub use mapper::{bookmark_id, map_bookmarks, map_services};
pub use schema::{BookmarkEntry, BookmarksFile, ServiceEntry, ServicesFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read catalog file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse catalog file: {0}")]
    Parse(String),

    #[error("no valid entries found in catalog")]
    Empty,
}
