use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external bookmark entry, reachable through the `@` query prefix.
///
/// Bookmarks point at URLs outside the managed services. Their identity is
/// a digest of the target URL, so renaming the label does not create a new
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Canonical unique identifier, derived from `url`.
    pub id: String,

    /// Short label used for matching, e.g. `ChatGPT`, `Docker Hub`.
    pub abbr: String,

    /// Full external URL to redirect to.
    pub url: String,

    /// Where this bookmark was discovered from, e.g. `catalog`.
    pub sources: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Updated on any mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft-delete marker, same lifecycle as services.
    #[serde(default)]
    pub disabled: bool,
}
