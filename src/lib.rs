//! Dynamic data source: per-call routing of database access across named PostgreSQL pools.
//!
//! Operations declare which database they use ([`Operation`], [`RoutedComponent`]); the
//! [`Interceptors`] install the declared key in a call-scoped [`ContextHolder`]; the
//! [`RoutingDataSource`] reads that key on every access to pick the pool.

pub mod config;
pub mod context;
pub mod declaration;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod interceptor;
pub mod key;
pub mod layer;
pub mod response;
pub mod routes;
pub mod routing;
pub mod service;
pub mod state;

pub use config::{connect, DataSourceProperties, DataSourcesConfig};
pub use context::ContextHolder;
pub use declaration::{DeclarationScope, Declarations, Operation, SelectorDeclaration};
pub use error::{AppError, ConfigError};
pub use extractors::DataSourceKey;
pub use interceptor::{
    ClearPolicy, ComponentInterceptor, Interceptors, OperationInterceptor, RoutedComponent,
};
pub use key::{DatabaseKey, MASTER, SLAVE1};
pub use layer::{RoutingLayer, RoutingService, DATASOURCE_HEADER};
pub use routes::{common_routes, replica_routes, user_routes};
pub use routing::{DataSourceRegistry, RoutingDataSource};
pub use service::{PgUserDao, UserDao, UserDto, UserService};
pub use state::AppState;
