use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub resolver: ResolverSettings,
    pub catalog: CatalogConfig,
    /// Cache store connection. Absent means degraded mode: ranking still
    /// works, nothing is cached, counters are lost on restart.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Grace period for draining in-flight requests on shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
    /// Hard deadline for a single request through the hot path.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    2
}

/// Resolution behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    /// Fallback redirect target for empty and unmatched queries.
    pub home_url: String,
    /// Host headers this instance answers for; also the seed for the
    /// redirect allow-list.
    pub allowed_hosts: Vec<String>,
    /// Deadline for each TLS probe and each cache operation, in ms.
    #[serde(default = "default_tls_timeout_ms")]
    pub tls_timeout_ms: u64,
    /// Treat every service as alive without probing. Development only.
    #[serde(default)]
    pub skip_tls_validation: bool,
    /// Upper bound on probed candidates per query. Zero means unlimited.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_tls_timeout_ms() -> u64 {
    500
}

fn default_max_candidates() -> usize {
    3
}

impl ResolverSettings {
    pub fn tls_timeout(&self) -> Duration {
        Duration::from_millis(self.tls_timeout_ms)
    }

    /// Derive the redirect allow-list from the configured hosts.
    ///
    /// Each host contributes itself (port stripped) plus its suffix past
    /// the first label, so `jump.example.com` also allows anything under
    /// `example.com`. Duplicates are dropped, order is preserved.
    pub fn allowed_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::with_capacity(self.allowed_hosts.len() * 2);

        for host in &self.allowed_hosts {
            let host = host.trim().to_lowercase();
            if host.is_empty() {
                continue;
            }

            let without_port = match host.rsplit_once(':') {
                // Keep IPv6 literals and portless hosts intact.
                Some((head, tail))
                    if !head.is_empty()
                        && !head.contains(':')
                        && tail.chars().all(|c| c.is_ascii_digit()) =>
                {
                    head.to_string()
                }
                _ => host.clone(),
            };

            if !domains.contains(&without_port) {
                domains.push(without_port.clone());
            }

            if let Some((_, suffix)) = without_port.split_once('.') {
                if suffix.contains('.') && !domains.iter().any(|d| d == suffix) {
                    domains.push(suffix.to_string());
                }
            }
        }

        domains
    }
}

/// Catalog file paths and reconciliation timers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Path to the services catalog file.
    pub service_file: PathBuf,
    /// Path to the bookmarks catalog file. Absent disables bookmarks.
    #[serde(default)]
    pub bookmark_file: Option<PathBuf>,
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
    #[serde(default = "default_gc_interval")]
    pub gc_interval_secs: u64,
    /// How long a soft-deleted entry survives before hard deletion.
    #[serde(default = "default_gc_threshold")]
    pub gc_threshold_secs: u64,
}

fn default_reload_interval() -> u64 {
    24 * 60 * 60
}

fn default_gc_interval() -> u64 {
    24 * 60 * 60
}

fn default_gc_threshold() -> u64 {
    30 * 24 * 60 * 60
}

impl CatalogConfig {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    pub fn gc_threshold(&self) -> Duration {
        Duration::from_secs(self.gc_threshold_secs)
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Connection URL, e.g. `redis://localhost:6379/0`.
    pub url: String,
    /// TTL for cached query resolutions.
    #[serde(default = "default_resolution_ttl")]
    pub resolution_ttl_secs: u64,
    /// TTL for service and bookmark records.
    #[serde(default = "default_entry_ttl")]
    pub entry_ttl_secs: u64,
}

fn default_resolution_ttl() -> u64 {
    24 * 60 * 60
}

fn default_entry_ttl() -> u64 {
    48 * 60 * 60
}

impl CacheConfig {
    pub fn resolution_ttl(&self) -> Duration {
        Duration::from_secs(self.resolution_ttl_secs)
    }

    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.entry_ttl_secs)
    }
}
