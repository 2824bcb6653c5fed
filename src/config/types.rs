//! Raw data source config as read from JSON or the environment.

use crate::interceptor::ClearPolicy;
use crate::key::{DatabaseKey, MASTER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

fn default_primary() -> DatabaseKey {
    MASTER
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

/// Connection parameters of one physical database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceProperties {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Defer connecting until the first acquire.
    #[serde(default)]
    pub lazy: bool,
}

impl DataSourceProperties {
    pub fn new(url: impl Into<String>) -> Self {
        DataSourceProperties {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            lazy: false,
        }
    }
}

/// All data sources plus the one used when no selector is active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourcesConfig {
    #[serde(default = "default_primary")]
    pub primary: DatabaseKey,
    #[serde(default)]
    pub component_clear_policy: ClearPolicy,
    pub sources: BTreeMap<DatabaseKey, DataSourceProperties>,
}
