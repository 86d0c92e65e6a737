//! Actor extraction.
//!
//! Sign-in lives in the identity provider in front of this service. It
//! forwards the authenticated user in trusted headers, which are turned into
//! an explicit [`Actor`] per request.
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::models::Actor;
use crate::utils::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLES_HEADER: &str = "x-actor-roles";

/// The authenticated actor. Rejects with 401 when the identity headers are
/// missing. Use `Option<CurrentActor>` for endpoints open to anonymous
/// readers.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, ACTOR_ID_HEADER)
            .ok_or_else(|| AppError::AuthError("Sign in to continue".to_string()))?;
        let roles = header(parts, ACTOR_ROLES_HEADER).unwrap_or_default();

        Ok(CurrentActor(Actor::from_roles(id, roles)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<CurrentActor, AppError> {
        let (mut parts, _) = req.into_parts();
        CurrentActor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_admin() {
        let req = Request::builder()
            .header(ACTOR_ID_HEADER, "user-1")
            .header(ACTOR_ROLES_HEADER, "User,Admin")
            .body(())
            .unwrap();
        let CurrentActor(actor) = extract(req).await.unwrap();
        assert_eq!(actor, Actor::admin("user-1"));
    }

    #[tokio::test]
    async fn test_missing_roles_means_plain_user() {
        let req = Request::builder()
            .header(ACTOR_ID_HEADER, "user-2")
            .body(())
            .unwrap();
        let CurrentActor(actor) = extract(req).await.unwrap();
        assert_eq!(actor, Actor::user("user-2"));
    }

    #[tokio::test]
    async fn test_blank_id_is_unauthenticated() {
        let req = Request::builder()
            .header(ACTOR_ID_HEADER, "  ")
            .body(())
            .unwrap();
        assert!(matches!(extract(req).await, Err(AppError::AuthError(_))));
    }
}
