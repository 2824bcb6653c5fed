//! Registry of physical data sources and the router that picks one per access.

use crate::context::ContextHolder;
use crate::key::DatabaseKey;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// Named physical handles plus the designated default. The default is always registered.
#[derive(Clone, Debug)]
pub struct DataSourceRegistry<H> {
    by_key: HashMap<DatabaseKey, H>,
    default_key: DatabaseKey,
}

impl<H> DataSourceRegistry<H> {
    pub fn new(default_key: DatabaseKey, default_handle: H) -> Self {
        let mut by_key = HashMap::new();
        by_key.insert(default_key.clone(), default_handle);
        DataSourceRegistry { by_key, default_key }
    }

    /// Register `handle` under `key`. Re-registering the default key replaces the default.
    pub fn with(mut self, key: DatabaseKey, handle: H) -> Self {
        self.register(key, handle);
        self
    }

    pub fn register(&mut self, key: DatabaseKey, handle: H) -> Option<H> {
        self.by_key.insert(key, handle)
    }

    pub fn get(&self, key: &str) -> Option<&H> {
        self.by_key.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn default_key(&self) -> &DatabaseKey {
        &self.default_key
    }

    pub fn default_handle(&self) -> &H {
        // The default entry is inserted in `new` and never removed.
        &self.by_key[&self.default_key]
    }

    pub fn keys(&self) -> impl Iterator<Item = &DatabaseKey> {
        self.by_key.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DatabaseKey, &H)> {
        self.by_key.iter()
    }

    /// Number of registered handles; never zero, the default is always present.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }
}

/// Picks the physical handle for the current call scope. Cheap to clone; the registry is
/// shared read-only.
#[derive(Debug)]
pub struct RoutingDataSource<H> {
    registry: Arc<DataSourceRegistry<H>>,
}

impl<H> Clone for RoutingDataSource<H> {
    fn clone(&self) -> Self {
        RoutingDataSource {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<H> RoutingDataSource<H> {
    pub fn new(registry: DataSourceRegistry<H>) -> Self {
        RoutingDataSource {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &DataSourceRegistry<H> {
        &self.registry
    }

    /// Key stored in the ambient context, if any.
    pub fn determine_current_lookup_key(&self) -> Option<DatabaseKey> {
        ContextHolder::current()
    }

    /// Handle for the current call scope. Unset and unregistered keys both yield the default
    /// handle. Evaluated on every call, never cached.
    pub fn resolve(&self) -> &H {
        self.lookup().1
    }

    /// Key of the handle [`RoutingDataSource::resolve`] returns right now.
    pub fn resolve_key(&self) -> &DatabaseKey {
        self.lookup().0
    }

    fn lookup(&self) -> (&DatabaseKey, &H) {
        let registry = &*self.registry;
        match self.determine_current_lookup_key() {
            None => (registry.default_key(), registry.default_handle()),
            Some(key) => match registry.by_key.get_key_value(&key) {
                Some((k, handle)) => {
                    tracing::trace!(datasource = %k, "routing to data source");
                    (k, handle)
                }
                None => {
                    tracing::debug!(
                        requested = %key,
                        datasource = %registry.default_key(),
                        "data source not registered; routing to default"
                    );
                    (registry.default_key(), registry.default_handle())
                }
            },
        }
    }
}

impl RoutingDataSource<PgPool> {
    /// Pool for the current call scope.
    pub fn pool(&self) -> &PgPool {
        self.resolve()
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, sqlx::Error> {
        self.resolve().acquire().await
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.resolve().begin().await
    }

    /// `SELECT 1` against every registered pool, each inside its own routing scope.
    pub async fn ping_all(&self) -> Vec<(DatabaseKey, bool)> {
        let mut keys: Vec<DatabaseKey> = self.registry.keys().cloned().collect();
        keys.sort();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let ok = ContextHolder::scope(key.clone(), async {
                sqlx::query("SELECT 1").fetch_optional(self.pool()).await
            })
            .await
            .map_err(|e| tracing::warn!(datasource = %key, error = %e, "data source ping failed"))
            .is_ok();
            out.push((key, ok));
        }
        out
    }

    pub async fn close(&self) {
        for (key, pool) in self.registry.iter() {
            tracing::info!(datasource = %key, "closing data source");
            pool.close().await;
        }
    }
}
