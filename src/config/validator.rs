//! Config validation: primary registered, usable pool sizes.

use crate::config::DataSourcesConfig;
use crate::error::ConfigError;

pub fn validate(config: &DataSourcesConfig) -> Result<(), ConfigError> {
    if config.sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    if !config.sources.contains_key(&config.primary) {
        return Err(ConfigError::UnknownPrimary(config.primary.to_string()));
    }
    for (key, props) in &config.sources {
        if props.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: format!("{} url", key),
                message: "must not be empty".into(),
            });
        }
        if props.max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: format!("{} max_connections", key),
                message: "must be at least 1".into(),
            });
        }
        if props.min_connections > props.max_connections {
            return Err(ConfigError::Invalid {
                name: format!("{} min_connections", key),
                message: format!(
                    "{} exceeds max_connections {}",
                    props.min_connections, props.max_connections
                ),
            });
        }
    }
    Ok(())
}
