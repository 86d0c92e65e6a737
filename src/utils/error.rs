use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::moderation::EventError;
use crate::profiles::ProfileError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Event(e) => match e {
                EventError::NotFound { .. } => StatusCode::NOT_FOUND,
                EventError::Validation(_) => StatusCode::BAD_REQUEST,
                EventError::Forbidden(_) => StatusCode::FORBIDDEN,
                EventError::InvalidTransition { .. }
                | EventError::ConcurrencyConflict { .. }
                | EventError::RegistrationClosed { .. }
                | EventError::SoldOut { .. } => StatusCode::CONFLICT,
                EventError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Profile(ProfileError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Profile(ProfileError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Event(e) => match e {
                EventError::NotFound { .. } => "NOT_FOUND",
                EventError::InvalidTransition { .. } => "INVALID_TRANSITION",
                EventError::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
                EventError::Validation(_) => "VALIDATION_ERROR",
                EventError::Forbidden(_) => "FORBIDDEN",
                EventError::RegistrationClosed { .. } => "REGISTRATION_CLOSED",
                EventError::SoldOut { .. } => "SOLD_OUT",
                EventError::Database(_) => "DATABASE_ERROR",
            },
            AppError::Profile(ProfileError::Validation(_)) => "VALIDATION_ERROR",
            AppError::Profile(ProfileError::Database(_)) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) => {
                warn!(code = self.code(), message = %msg, "Request refused");
            }
            AppError::Event(EventError::Database(e))
            | AppError::Profile(ProfileError::Database(e)) => {
                error!(error = ?e, "Database error");
            }
            AppError::Event(e) => {
                // Expected outcomes of user actions.
                warn!(code = self.code(), message = %e, "Event operation refused");
            }
            AppError::Profile(ProfileError::Validation(errors)) => {
                warn!(code = self.code(), message = %errors, "Profile update refused");
            }
        }
    }

    /// Machine-readable context for the client. Database internals are
    /// never included.
    fn details(&self) -> Option<Value> {
        let e = match self {
            AppError::Event(e) => e,
            AppError::Profile(ProfileError::Validation(errors)) => {
                return Some(json!({ "fields": errors.0 }));
            }
            _ => return None,
        };

        match e {
            EventError::Validation(errors) => Some(json!({ "fields": errors.0 })),
            EventError::InvalidTransition {
                id,
                operation,
                status,
            } => Some(json!({ "id": id, "operation": operation, "status": status })),
            EventError::SoldOut { id, capacity } => {
                Some(json!({ "id": id, "capacity": capacity }))
            }
            other => other
                .context()
                .map(|(id, status)| json!({ "id": id, "status": status })),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let public_message = match &self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) => msg.clone(),
            AppError::Event(EventError::Database(_))
            | AppError::Profile(ProfileError::Database(_)) => {
                "A database error occurred".to_string()
            }
            AppError::Event(e) => e.to_string(),
            AppError::Profile(e) => e.to_string(),
        };

        let details = self.details();

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApprovalStatus, ValidationErrors};
    use crate::moderation::Operation;

    #[test]
    fn test_domain_errors_map_to_http() {
        let err = AppError::from(EventError::InvalidTransition {
            id: 5,
            operation: Operation::Restore,
            status: ApprovalStatus::Pending,
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "INVALID_TRANSITION");
        assert_eq!(
            err.details(),
            Some(json!({ "id": 5, "operation": "restore", "status": "pending" }))
        );

        let err = AppError::from(EventError::ConcurrencyConflict {
            id: 5,
            status: ApprovalStatus::Approved,
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.details(), Some(json!({ "id": 5, "status": "approved" })));

        let err = AppError::from(EventError::NotFound { id: 9 });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.details(), Some(json!({ "id": 9, "status": null })));

        let err = AppError::from(EventError::Forbidden("no".into()));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = AppError::from(EventError::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(err.details(), None);

        let err = AppError::from(ProfileError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_request_shape_errors_are_validation_errors() {
        let err = AppError::ValidationError("Invalid URL".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.details(), None);

        let err = AppError::from(ProfileError::Validation(ValidationErrors::single(
            "full_name",
            "full_name is required.",
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let field = json!({ "field": "full_name", "message": "full_name is required." });
        assert_eq!(err.details(), Some(json!({ "fields": [field] })));
    }
}
