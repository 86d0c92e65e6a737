use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};

use super::{expected_version, json_body, path_id, VersionParams};
use crate::auth::CurrentActor;
use crate::models::EventDraft;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

/// Approved events, soonest first.
pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.events.list_public().await?;
    Ok(success(events, "Events retrieved").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    actor: Option<CurrentActor>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_id(id)?;
    let actor = actor.map(|CurrentActor(actor)| actor);
    let event = state.events.get_visible(actor.as_ref(), id).await?;
    Ok(success(event, "Event retrieved").into_response())
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let draft = json_body(payload)?;
    let event = state.events.submit(&actor, draft).await?;
    Ok(created(
        event,
        "Event submitted for approval. An admin will review it soon.",
    )
    .into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
    params: Result<Query<VersionParams>, QueryRejection>,
    payload: Result<Json<EventDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let id = path_id(id)?;
    let version = expected_version(params)?;
    let draft = json_body(payload)?;
    let event = state.events.edit(&actor, id, draft, version).await?;
    Ok(success(event, "Event updated").into_response())
}

/// The caller's own events in every status, newest first.
pub async fn my_events(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Response, AppError> {
    let events = state.events.list_mine(&actor).await?;
    Ok(success(events, "Events retrieved").into_response())
}

pub async fn register(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let id = path_id(id)?;
    let event = state.events.register(&actor, id).await?;
    Ok(success(event, "You are registered!").into_response())
}
