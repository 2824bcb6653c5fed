//! Extract the requested data source from the request (`X-DataSource` header).

use crate::key::DatabaseKey;
use crate::layer::DATASOURCE_HEADER;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Optional data source key from the `X-DataSource` header. Handlers pass it explicitly to
/// [`crate::ContextHolder::scope`] instead of relying on middleware.
#[derive(Clone, Debug)]
pub struct DataSourceKey(pub Option<DatabaseKey>);

#[async_trait]
impl<S> FromRequestParts<S> for DataSourceKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(DATASOURCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(DatabaseKey::new);
        Ok(DataSourceKey(value))
    }
}
