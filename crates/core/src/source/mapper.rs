use chrono::Utc;
use sha2::{Digest, Sha256};
use url::Url;

use crate::domain::{Bookmark, Service};

use super::schema::{BookmarksFile, ServicesFile};
use super::SourceError;

/// Normalize parsed service entries into domain services.
///
/// Entries without an `href`, with an unparseable `href`, or without a
/// hostname are dropped. Zero survivors is an error so a broken file never
/// silently empties the index.
pub fn map_services(config: &ServicesFile) -> Result<Vec<Service>, SourceError> {
    let now = Utc::now();
    let mut services = Vec::new();

    for group in config {
        for entries in group.values() {
            for entry_map in entries {
                for entry in entry_map.values() {
                    if entry.href.is_empty() {
                        continue;
                    }
                    let Ok(parsed) = Url::parse(&entry.href) else {
                        continue;
                    };
                    let Some(hostname) = parsed.host_str() else {
                        continue;
                    };
                    services.push(Service::from_catalog(hostname.to_lowercase(), now));
                }
            }
        }
    }

    if services.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(services)
}

/// Normalize parsed bookmark entries into domain bookmarks.
///
/// The label is `abbr` when present, else the entry name. Identity comes
/// from the target URL, so relabeling keeps counters and history.
pub fn map_bookmarks(config: &BookmarksFile) -> Result<Vec<Bookmark>, SourceError> {
    let now = Utc::now();
    let mut bookmarks = Vec::new();

    for category in config {
        for entry_maps in category.values() {
            for entry_map in entry_maps {
                for (name, entry_list) in entry_map {
                    // Each bookmark name maps to a single-element list.
                    let Some(entry) = entry_list.first() else {
                        continue;
                    };
                    if entry.href.is_empty() {
                        continue;
                    }

                    let abbr = if entry.abbr.is_empty() {
                        name.clone()
                    } else {
                        entry.abbr.clone()
                    };

                    bookmarks.push(Bookmark {
                        id: bookmark_id(&entry.href),
                        abbr,
                        url: entry.href.clone(),
                        sources: vec!["catalog".to_string()],
                        created_at: Some(now),
                        updated_at: Some(now),
                        disabled: false,
                    });
                }
            }
        }
    }

    if bookmarks.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(bookmarks)
}

/// Stable bookmark identifier: the first 16 hex characters of the SHA-256
/// digest of the URL bytes.
pub fn bookmark_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}
