//! User routes. The replica router is wrapped in a fixed routing layer, so every handler
//! mounted there reads from slave1 without declaring it.

use crate::handlers::user::{create, list_master, list_pinned, list_replica, list_routed};
use crate::key::SLAVE1;
use crate::layer::RoutingLayer;
use crate::state::AppState;
use axum::{routing::get, Router};

/// GET/POST /users, GET /users/replica, GET /replica-users.
pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_master).post(create))
        .route("/users/replica", get(list_replica))
        .route("/replica-users", get(list_pinned))
        .with_state(state)
}

/// GET /users, always against slave1.
pub fn replica_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_routed))
        .layer(RoutingLayer::fixed(SLAVE1))
        .with_state(state)
}
