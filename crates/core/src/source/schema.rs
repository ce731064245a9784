//! Serde schema for the catalog YAML dialect.
//!
//! The file uses dynamic keys: a list of groups, each group name mapping to
//! a list of entries, each entry name mapping to its properties. Bookmarks
//! nest one level deeper, with each name mapping to a single-element list.

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level structure of the services file.
pub type ServicesFile = Vec<HashMap<String, Vec<HashMap<String, ServiceEntry>>>>;

/// Properties of a single service entry. Only `href` matters for routing;
/// the rest is tolerated dashboard metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceEntry {
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Top-level structure of the bookmarks file.
pub type BookmarksFile = Vec<HashMap<String, Vec<HashMap<String, Vec<BookmarkEntry>>>>>;

/// Properties of a single bookmark entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarkEntry {
    #[serde(default)]
    pub abbr: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub icon: Option<String>,
}
