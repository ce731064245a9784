use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical runtime truth of a routable service.
///
/// All inputs (catalog file, cache store, usage learning) are merged into
/// this structure. A service is uniquely identified by its hostname: `id`
/// is always equal to `hostname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Canonical unique identifier, equal to `hostname`.
    pub id: String,

    /// DNS hostname of the service, e.g. `jellyfin.example.com`.
    pub hostname: String,

    /// Derived from the first DNS label, e.g. `jellyfin`.
    pub name: String,

    /// Where this service was discovered from, e.g. `catalog`.
    pub sources: Vec<String>,

    /// Number of successful redirects.
    pub counter: u64,

    /// First time the service was discovered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Updated on any mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Updated only after a successful redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,

    /// Updated whenever the service is observed from any source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,

    /// Soft-delete marker. Disabled services are invisible to ranking but
    /// stay in the index until garbage collection.
    #[serde(default)]
    pub disabled: bool,
}

impl Service {
    /// Create a service freshly observed from a catalog source.
    pub fn from_catalog(hostname: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        let hostname = hostname.into();
        let name = hostname.split('.').next().unwrap_or(&hostname).to_string();
        Self {
            id: hostname.clone(),
            hostname,
            name,
            sources: vec!["catalog".to_string()],
            counter: 0,
            created_at: None,
            updated_at: None,
            last_used_at: None,
            last_seen_at: Some(observed_at),
            disabled: false,
        }
    }

    /// Whether this entry was discovered from the given source tag.
    pub fn has_source(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }
}
