use url::Url;

use super::{types::Config, ConfigError};

/// Validate configuration invariants that serde cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if Url::parse(&config.resolver.home_url).is_err() {
        return Err(ConfigError::ValidationError(format!(
            "resolver.home_url is not a valid URL: {}",
            config.resolver.home_url
        )));
    }

    if config.resolver.allowed_hosts.is_empty() {
        return Err(ConfigError::ValidationError(
            "resolver.allowed_hosts must not be empty".to_string(),
        ));
    }

    if config.catalog.reload_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.reload_interval_secs must be positive".to_string(),
        ));
    }

    if config.catalog.gc_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.gc_interval_secs must be positive".to_string(),
        ));
    }

    Ok(())
}
