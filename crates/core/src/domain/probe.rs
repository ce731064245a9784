//! Best-effort TLS reachability probe.
//!
//! A probe is a single HEAD request to `https://<hostname>/` with redirects
//! disabled and no connection reuse. Any HTTP status counts as alive: the
//! point is reachability plus a certificate that validates against the
//! system trust store, not content.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("probe failed: {0}")]
    Request(String),
}

/// Probes hostnames for liveness over HTTPS.
pub struct Prober {
    client: reqwest::Client,
    skip_tls_validation: bool,
}

impl Prober {
    /// Build a prober with the given per-probe deadline.
    ///
    /// When `skip_tls_validation` is set, every probe succeeds without any
    /// network I/O. Development only.
    pub fn new(timeout: Duration, skip_tls_validation: bool) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            skip_tls_validation,
        })
    }

    /// Check that `hostname` answers over HTTPS with a valid certificate.
    pub async fn probe(&self, hostname: &str) -> Result<(), ProbeError> {
        if self.skip_tls_validation {
            debug!(hostname, "tls validation disabled, treating as alive");
            return Ok(());
        }

        let url = format!("https://{hostname}/");
        match self.client.head(&url).send().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_timeout() => Err(ProbeError::Timeout),
            Err(e) if e.is_connect() => Err(ProbeError::ConnectionFailed(e.to_string())),
            Err(e) => Err(ProbeError::Request(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skip_flag_short_circuits_without_network() {
        let prober = Prober::new(Duration::from_millis(1), true).unwrap();
        // An unresolvable name still probes fine when validation is off.
        assert!(prober.probe("does-not-exist.invalid").await.is_ok());
    }

    #[tokio::test]
    async fn unresolvable_hostname_fails() {
        let prober = Prober::new(Duration::from_millis(200), false).unwrap();
        let err = prober.probe("does-not-exist.invalid").await;
        assert!(err.is_err());
    }
}
