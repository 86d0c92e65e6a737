use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};

use super::json_body;
use crate::auth::CurrentActor;
use crate::models::ProfileUpdate;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn get_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Response, AppError> {
    let profile = state.profiles.get(&actor).await?;
    Ok(success(profile, "Profile retrieved").into_response())
}

/// Replaces the caller's profile fields. Omitted optional fields are cleared.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Response, AppError> {
    let update = json_body(payload)?;
    let profile = state.profiles.update(&actor, update).await?;
    Ok(success(profile, "Profile updated successfully!").into_response())
}
