//! Example consumer: master/replica user service on top of dynamic-datasource.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Configure with `DATASOURCE_NAMES=master,slave1`, `DATASOURCE_MASTER_URL`, `DATASOURCE_SLAVE1_URL`
//! (or `DATABASE_URL` for the primary). Both databases need a `users (id SERIAL, name TEXT, age INT)` table.

use axum::Router;
use dynamic_datasource::{
    common_routes, connect, replica_routes, user_routes, AppState, DataSourcesConfig, PgUserDao,
    UserService, SLAVE1,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dynamic_datasource=info")),
        )
        .init();

    let config = match std::env::var("DATASOURCE_CONFIG") {
        Ok(path) => DataSourcesConfig::load_from_path(path).await?,
        Err(_) => DataSourcesConfig::from_env()?,
    };
    let datasource = connect(&config).await?;
    let users = UserService::with_policy(
        PgUserDao::new(datasource.clone()),
        config.component_clear_policy,
    );
    let replica_users = UserService::with_policy(
        PgUserDao::new(datasource.clone()),
        config.component_clear_policy,
    )
    .pinned_to(SLAVE1);
    let state = AppState::new(datasource.clone(), users, replica_users);

    let app = Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/v1", user_routes(state.clone()))
        .nest("/api/v1/replica", replica_routes(state))
        .layer(TraceLayer::new_for_http());

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("example consumer listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    datasource.close().await;
    Ok(())
}
