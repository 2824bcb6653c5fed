//! Standard response envelope helpers. `meta.datasource` names the database that served the call.

use crate::key::DatabaseKey;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Meta {
    pub datasource: DatabaseKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: Meta,
}

pub fn success_many<T: Serialize>(
    data: Vec<T>,
    datasource: DatabaseKey,
) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    let count = Some(data.len() as u64);
    (
        StatusCode::OK,
        Json(Envelope {
            data,
            meta: Meta { datasource, count },
        }),
    )
}

pub fn success_created<T: Serialize>(
    data: T,
    datasource: DatabaseKey,
) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            data,
            meta: Meta {
                datasource,
                count: None,
            },
        }),
    )
}
