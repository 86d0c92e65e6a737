use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
};

use super::{expected_version, path_id, VersionParams};
use crate::auth::CurrentActor;
use crate::moderation::TransitionResult;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

fn transition_response(result: TransitionResult, verb: &str) -> Response {
    let message = if result.changed {
        format!("{}: #{} ({})", verb, result.event.id, result.event.title)
    } else {
        format!(
            "Already approved: #{} ({})",
            result.event.id, result.event.title
        )
    };
    success(result, message).into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Response, AppError> {
    let stats = state.events.dashboard(&actor).await?;
    Ok(success(stats, "Dashboard retrieved").into_response())
}

/// Pending events, soonest first.
pub async fn pending(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Response, AppError> {
    let events = state.events.list_pending(&actor).await?;
    Ok(success(events, "Pending events retrieved").into_response())
}

/// Rejected events, newest first.
pub async fn rejected(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Response, AppError> {
    let events = state.events.list_rejected(&actor).await?;
    Ok(success(events, "Rejected events retrieved").into_response())
}

pub async fn approve(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
    params: Result<Query<VersionParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (id, version) = (path_id(id)?, expected_version(params)?);
    let result = state.events.approve(&actor, id, version).await?;
    Ok(transition_response(result, "Approved"))
}

pub async fn approve_rejected(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
    params: Result<Query<VersionParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (id, version) = (path_id(id)?, expected_version(params)?);
    let result = state.events.approve_rejected(&actor, id, version).await?;
    Ok(transition_response(result, "Approved"))
}

pub async fn reject(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
    params: Result<Query<VersionParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (id, version) = (path_id(id)?, expected_version(params)?);
    let result = state.events.reject(&actor, id, version).await?;
    Ok(transition_response(result, "Rejected"))
}

pub async fn restore(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
    params: Result<Query<VersionParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (id, version) = (path_id(id)?, expected_version(params)?);
    let result = state.events.restore(&actor, id, version).await?;
    Ok(transition_response(result, "Restored to Pending"))
}
