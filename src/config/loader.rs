//! Load data source config from JSON or environment variables, and connect the pools.

use crate::config::types::*;
use crate::config::validate;
use crate::error::{AppError, ConfigError};
use crate::interceptor::ClearPolicy;
use crate::key::{DatabaseKey, MASTER};
use crate::routing::{DataSourceRegistry, RoutingDataSource};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Fallback URL for the primary when `DATASOURCE_<PRIMARY>_URL` is unset.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

impl DataSourcesConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: DataSourcesConfig = serde_json::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }

    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Read the process environment. See [`DataSourcesConfig::from_lookup`] for variable names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from named variables:
    ///
    /// - `DATASOURCE_PRIMARY` (default `master`)
    /// - `DATASOURCE_NAMES`: comma-separated keys (default: the primary only)
    /// - `DATASOURCE_<NAME>_URL`; the primary falls back to `DATABASE_URL`
    /// - `DATASOURCE_<NAME>_MAX_CONNECTIONS`, `_MIN_CONNECTIONS`, `_ACQUIRE_TIMEOUT_SECS`, `_LAZY`
    /// - `DATASOURCE_COMPONENT_CLEAR_POLICY`: `scoped` or `leave_set`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let primary = non_empty("DATASOURCE_PRIMARY")
            .map(DatabaseKey::new)
            .unwrap_or(MASTER);
        let names: Vec<DatabaseKey> = match non_empty("DATASOURCE_NAMES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(DatabaseKey::new)
                .collect(),
            None => vec![primary.clone()],
        };
        let component_clear_policy: ClearPolicy = match non_empty("DATASOURCE_COMPONENT_CLEAR_POLICY") {
            Some(v) => v.parse()?,
            None => Default::default(),
        };

        let mut sources = BTreeMap::new();
        for key in names {
            let prefix = format!("DATASOURCE_{}", key.env_segment());
            let url_var = format!("{}_URL", prefix);
            let url = non_empty(&url_var)
                .or_else(|| {
                    if key == primary {
                        non_empty(DATABASE_URL_VAR)
                    } else {
                        None
                    }
                })
                .ok_or_else(|| ConfigError::MissingVar(url_var.clone()))?;

            let mut props = DataSourceProperties::new(url);
            if let Some(v) = non_empty(&format!("{}_MAX_CONNECTIONS", prefix)) {
                props.max_connections = parse_var(&format!("{}_MAX_CONNECTIONS", prefix), &v)?;
            }
            if let Some(v) = non_empty(&format!("{}_MIN_CONNECTIONS", prefix)) {
                props.min_connections = parse_var(&format!("{}_MIN_CONNECTIONS", prefix), &v)?;
            }
            if let Some(v) = non_empty(&format!("{}_ACQUIRE_TIMEOUT_SECS", prefix)) {
                props.acquire_timeout_secs =
                    parse_var(&format!("{}_ACQUIRE_TIMEOUT_SECS", prefix), &v)?;
            }
            if let Some(v) = non_empty(&format!("{}_LAZY", prefix)) {
                props.lazy = parse_var(&format!("{}_LAZY", prefix), &v.to_lowercase())?;
            }
            sources.insert(key, props);
        }

        let config = DataSourcesConfig {
            primary,
            component_clear_policy,
            sources,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name: name.to_string(),
        message: format!("{}: {}", value, e),
    })
}

pub fn pool_options(props: &DataSourceProperties) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(props.max_connections)
        .min_connections(props.min_connections)
        .acquire_timeout(Duration::from_secs(props.acquire_timeout_secs))
}

/// Create one pool per configured source and route between them, the primary being the default.
pub async fn connect(config: &DataSourcesConfig) -> Result<RoutingDataSource<PgPool>, AppError> {
    validate(config)?;
    let mut pools = BTreeMap::new();
    for (key, props) in &config.sources {
        let options = pool_options(props);
        let pool = if props.lazy {
            options.connect_lazy(&props.url)?
        } else {
            options.connect(&props.url).await?
        };
        tracing::info!(
            datasource = %key,
            max_connections = props.max_connections,
            lazy = props.lazy,
            "registered data source"
        );
        pools.insert(key.clone(), pool);
    }

    let primary_pool = pools
        .remove(&config.primary)
        .ok_or_else(|| ConfigError::UnknownPrimary(config.primary.to_string()))?;
    let mut registry = DataSourceRegistry::new(config.primary.clone(), primary_pool);
    for (key, pool) in pools {
        registry.register(key, pool);
    }
    Ok(RoutingDataSource::new(registry))
}
