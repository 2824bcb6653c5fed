//! Logical database keys. A key names one entry of the data source registry.

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Name of one logical database ("master", "slave1", ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseKey(Cow<'static, str>);

/// Primary database, used whenever no selector is active.
pub const MASTER: DatabaseKey = DatabaseKey::from_static("master");

/// First read replica.
pub const SLAVE1: DatabaseKey = DatabaseKey::from_static("slave1");

impl DatabaseKey {
    pub const fn from_static(name: &'static str) -> Self {
        DatabaseKey(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        DatabaseKey(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercased form used in environment variable names (`slave-1` -> `SLAVE_1`).
    pub fn env_segment(&self) -> String {
        self.0.to_ascii_uppercase().replace('-', "_")
    }
}

impl Default for DatabaseKey {
    fn default() -> Self {
        MASTER
    }
}

impl fmt::Display for DatabaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DatabaseKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DatabaseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for DatabaseKey {
    fn from(s: &'static str) -> Self {
        DatabaseKey::from_static(s)
    }
}

impl From<String> for DatabaseKey {
    fn from(s: String) -> Self {
        DatabaseKey::new(s)
    }
}
