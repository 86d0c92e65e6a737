use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod admin;
pub mod events;
pub mod profile;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "contest-connect-api",
    };

    success(payload, "Health check successful").into_response()
}

/// `?version=N`: the row token the caller last saw. A mismatch is reported
/// as a concurrency conflict instead of overwriting newer changes.
#[derive(Debug, Default, Deserialize)]
pub struct VersionParams {
    pub version: Option<i32>,
}

// Malformed bodies, ids and query strings get the same error envelope as
// everything else instead of axum's plain-text rejections.

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

fn expected_version(
    query: Result<Query<VersionParams>, QueryRejection>,
) -> Result<Option<i32>, AppError> {
    query
        .map(|Query(params)| params.version)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}
