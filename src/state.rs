//! Shared application state for all routes.

use crate::routing::RoutingDataSource;
use crate::service::{PgUserDao, UserService};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub datasource: RoutingDataSource<PgPool>,
    pub users: Arc<UserService<PgUserDao>>,
    /// Same operations, pinned to the replica as a whole.
    pub replica_users: Arc<UserService<PgUserDao>>,
}

impl AppState {
    pub fn new(
        datasource: RoutingDataSource<PgPool>,
        users: UserService<PgUserDao>,
        replica_users: UserService<PgUserDao>,
    ) -> Self {
        AppState {
            datasource,
            users: Arc::new(users),
            replica_users: Arc::new(replica_users),
        }
    }
}
