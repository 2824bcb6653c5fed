//! User handlers: master reads, replica reads, writes to the requested data source.

use crate::context::ContextHolder;
use crate::declaration::Operation;
use crate::error::AppError;
use crate::extractors::DataSourceKey;
use crate::interceptor::OperationInterceptor;
use crate::key::DatabaseKey;
use crate::response::{success_created, success_many};
use crate::service::{PgUserDao, UserDto, UserService};
use crate::state::AppState;
use axum::{extract::State, Json};

type Users = UserService<PgUserDao>;

/// Database a declared operation of the user service ends up on.
fn served_by(state: &AppState, service: &Users, operation: &Operation) -> DatabaseKey {
    match OperationInterceptor::resolve(service, operation) {
        Some(key) => ContextHolder::sync_scope(key, || state.datasource.resolve_key().clone()),
        None => state.datasource.resolve_key().clone(),
    }
}

/// GET /api/v1/users: read from master.
pub async fn list_master(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let users = state.users.get_list_by_master().await?;
    Ok(success_many(users, served_by(&state, &state.users, &Users::LIST_BY_MASTER)))
}

/// GET /api/v1/users/replica: read from slave1.
pub async fn list_replica(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let users = state.users.get_list_by_slave().await?;
    Ok(success_many(users, served_by(&state, &state.users, &Users::LIST_BY_SLAVE)))
}

/// GET /api/v1/replica-users: undeclared read on the service pinned to slave1.
pub async fn list_pinned(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let users = state.replica_users.list_users().await?;
    Ok(success_many(
        users,
        served_by(&state, &state.replica_users, &Users::LIST_USERS),
    ))
}

/// GET /users under a routed router: read from whatever the surrounding layer selected.
pub async fn list_routed(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let users = state.users.list_users().await?;
    Ok(success_many(users, state.datasource.resolve_key().clone()))
}

/// POST /api/v1/users: insert into the data source named by `X-DataSource`, master otherwise.
pub async fn create(
    State(state): State<AppState>,
    DataSourceKey(requested): DataSourceKey,
    Json(body): Json<UserDto>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let work = async {
        let inserted = state.users.create_user(&body).await?;
        Ok::<_, AppError>((inserted, state.datasource.resolve_key().clone()))
    };
    let (inserted, datasource) = match requested {
        Some(key) => ContextHolder::scope(key, work).await?,
        None => work.await?,
    };
    Ok(success_created(
        serde_json::json!({ "inserted": inserted }),
        datasource,
    ))
}
