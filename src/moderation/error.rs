use thiserror::Error;

use super::Operation;
use crate::models::{ApprovalStatus, ValidationErrors};

/// Failures of event operations. None of these leave a record partially
/// updated.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event #{id} was not found")]
    NotFound { id: i32 },

    #[error("Cannot {operation} event #{id} while it is {status}")]
    InvalidTransition {
        id: i32,
        operation: Operation,
        status: ApprovalStatus,
    },

    #[error("Event #{id} was changed by someone else (now {status}); reload and try again")]
    ConcurrencyConflict { id: i32, status: ApprovalStatus },

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Forbidden(String),

    #[error("Event #{id} is not open for registration")]
    RegistrationClosed { id: i32, status: ApprovalStatus },

    #[error("Tickets for event #{id} are sold out")]
    SoldOut { id: i32, capacity: i32 },

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl EventError {
    /// Record id and status the caller needs to decide on a retry.
    pub fn context(&self) -> Option<(i32, Option<ApprovalStatus>)> {
        match self {
            EventError::NotFound { id } => Some((*id, None)),
            EventError::InvalidTransition { id, status, .. }
            | EventError::ConcurrencyConflict { id, status }
            | EventError::RegistrationClosed { id, status } => Some((*id, Some(*status))),
            EventError::SoldOut { id, .. } => Some((*id, Some(ApprovalStatus::Approved))),
            EventError::Validation(_) | EventError::Forbidden(_) | EventError::Database(_) => None,
        }
    }
}
