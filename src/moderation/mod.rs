//! Event moderation rules.
//!
//! Everything here is pure: functions take the current record plus an
//! explicit actor and clock value and return the record to persist. The
//! [`service`] module pairs them with an [`EventStore`](crate::store::EventStore).

pub mod error;
pub mod service;

pub use error::EventError;
pub use service::{EventService, TransitionResult};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::{Actor, ApprovalStatus, Event};

/// Status-guarded operations on an existing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Approve,
    /// Approve, but only from the rejected list.
    ApproveRejected,
    Reject,
    Restore,
    /// Owner edit of the event content.
    Edit,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Approve | Operation::ApproveRejected => "approve",
            Operation::Reject => "reject",
            Operation::Restore => "restore",
            Operation::Edit => "edit",
        })
    }
}

/// Result of asking the state machine about an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operation is allowed and leaves the event in this status.
    Enter(ApprovalStatus),
    /// Approve on an approved event: reported, nothing written.
    AlreadyApproved,
    Refused,
}

impl Operation {
    /// Transition table. Every status/operation pair is listed.
    pub fn outcome(self, from: ApprovalStatus) -> Outcome {
        use ApprovalStatus::*;

        match (self, from) {
            (Operation::Approve, Pending) => Outcome::Enter(Approved),
            (Operation::Approve, Rejected) => Outcome::Enter(Approved),
            (Operation::Approve, Approved) => Outcome::AlreadyApproved,

            (Operation::ApproveRejected, Rejected) => Outcome::Enter(Approved),
            (Operation::ApproveRejected, Pending) => Outcome::Refused,
            (Operation::ApproveRejected, Approved) => Outcome::Refused,

            (Operation::Reject, Pending) => Outcome::Enter(Rejected),
            (Operation::Reject, Approved) => Outcome::Refused,
            (Operation::Reject, Rejected) => Outcome::Refused,

            (Operation::Restore, Rejected) => Outcome::Enter(Pending),
            (Operation::Restore, Pending) => Outcome::Refused,
            (Operation::Restore, Approved) => Outcome::Refused,

            (Operation::Edit, Pending) => Outcome::Enter(Pending),
            (Operation::Edit, Approved) => Outcome::Refused,
            (Operation::Edit, Rejected) => Outcome::Refused,
        }
    }

    pub fn requires_admin(self) -> bool {
        !matches!(self, Operation::Edit)
    }
}

/// An event after a moderation operation, and whether anything changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Moderated {
    pub event: Event,
    pub changed: bool,
}

/// Applies a moderation operation to `event` as `actor` at `now`.
///
/// Keeps `approved_at` set exactly when the result is approved. The input is
/// never mutated; on refusal the caller still holds the untouched record.
pub fn moderate(
    event: &Event,
    operation: Operation,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Moderated, EventError> {
    if operation.requires_admin() && !actor.is_admin {
        return Err(EventError::Forbidden(format!(
            "Only administrators can {} events",
            operation
        )));
    }

    match operation.outcome(event.approval_status) {
        Outcome::AlreadyApproved => Ok(Moderated {
            event: event.clone(),
            changed: false,
        }),
        Outcome::Refused => Err(EventError::InvalidTransition {
            id: event.id,
            operation,
            status: event.approval_status,
        }),
        Outcome::Enter(next) => {
            let mut updated = event.clone();
            updated.approval_status = next;
            if next == ApprovalStatus::Approved {
                updated.approved_at = Some(now);
                updated.approved_by_id = Some(actor.id.clone());
            } else {
                updated.approved_at = None;
                updated.approved_by_id = None;
            }
            Ok(Moderated {
                event: updated,
                changed: true,
            })
        }
    }
}

/// Whether `actor` may see `event`. Approved events are public; owners and
/// administrators also see pending and rejected ones.
pub fn can_view(event: &Event, actor: Option<&Actor>) -> bool {
    if event.approval_status == ApprovalStatus::Approved {
        return true;
    }
    match actor {
        Some(actor) => actor.is_admin || event.is_owned_by(&actor.id),
        None => false,
    }
}

/// Returns the event with one more registration, or why that is refused.
pub fn register(event: &Event) -> Result<Event, EventError> {
    if event.approval_status != ApprovalStatus::Approved {
        return Err(EventError::RegistrationClosed {
            id: event.id,
            status: event.approval_status,
        });
    }
    if let Some(capacity) = event.ticket_capacity {
        if event.registered_count >= capacity {
            return Err(EventError::SoldOut {
                id: event.id,
                capacity,
            });
        }
    }

    // Unlimited events still stop at the counter's range.
    let registered_count = event
        .registered_count
        .checked_add(1)
        .ok_or(EventError::SoldOut {
            id: event.id,
            capacity: event.registered_count,
        })?;

    let mut updated = event.clone();
    updated.registered_count = registered_count;
    Ok(updated)
}

/// Checks that `actor` may edit the content of `event`.
pub fn check_edit(event: &Event, actor: &Actor) -> Result<(), EventError> {
    if !event.is_owned_by(&actor.id) {
        return Err(EventError::Forbidden(format!(
            "Only the submitter can edit event #{}",
            event.id
        )));
    }
    match Operation::Edit.outcome(event.approval_status) {
        Outcome::Enter(_) => Ok(()),
        Outcome::AlreadyApproved | Outcome::Refused => Err(EventError::InvalidTransition {
            id: event.id,
            operation: Operation::Edit,
            status: event.approval_status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn sample_event(status: ApprovalStatus) -> Event {
        let starts_at = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        Event {
            id: 42,
            title: "Spring hackathon".to_string(),
            description: "24 hours of building".to_string(),
            starts_at,
            ends_at: starts_at + Duration::hours(24),
            location: None,
            is_online: true,
            price: Decimal::ZERO,
            image_path: None,
            ticket_capacity: Some(2),
            registered_count: 0,
            created_by_id: "owner".to_string(),
            approval_status: status,
            created_at: starts_at - Duration::days(30),
            approved_at: match status {
                ApprovalStatus::Approved => Some(starts_at - Duration::days(20)),
                _ => None,
            },
            approved_by_id: None,
            version: 3,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    const ALL_STATUSES: [ApprovalStatus; 3] = [
        ApprovalStatus::Pending,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ];

    const ALL_OPERATIONS: [Operation; 5] = [
        Operation::Approve,
        Operation::ApproveRejected,
        Operation::Reject,
        Operation::Restore,
        Operation::Edit,
    ];

    #[test]
    fn test_approved_at_tracks_status_for_every_transition() {
        let admin = Actor::admin("admin");
        for status in ALL_STATUSES {
            for op in ALL_OPERATIONS.into_iter().filter(|op| op.requires_admin()) {
                let event = sample_event(status);
                if let Ok(result) = moderate(&event, op, &admin, now()) {
                    let e = result.event;
                    assert_eq!(
                        e.approval_status == ApprovalStatus::Approved,
                        e.approved_at.is_some(),
                        "{:?} from {:?}",
                        op,
                        status
                    );
                }
            }
        }
    }

    #[test]
    fn test_approve_from_pending_and_rejected() {
        let admin = Actor::admin("admin");
        for status in [ApprovalStatus::Pending, ApprovalStatus::Rejected] {
            let result =
                moderate(&sample_event(status), Operation::Approve, &admin, now()).unwrap();
            assert!(result.changed);
            assert_eq!(result.event.approval_status, ApprovalStatus::Approved);
            assert_eq!(result.event.approved_at, Some(now()));
            assert_eq!(result.event.approved_by_id.as_deref(), Some("admin"));
        }
    }

    #[test]
    fn test_approve_twice_is_a_no_op() {
        let admin = Actor::admin("admin");
        let first = moderate(
            &sample_event(ApprovalStatus::Pending),
            Operation::Approve,
            &admin,
            now(),
        )
        .unwrap();
        let later = now() + Duration::minutes(5);
        let second = moderate(&first.event, Operation::Approve, &admin, later).unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.event, first.event);
        assert_eq!(second.event.approved_at, Some(now()));
    }

    #[test]
    fn test_reject_only_from_pending() {
        let admin = Actor::admin("admin");
        let result = moderate(
            &sample_event(ApprovalStatus::Pending),
            Operation::Reject,
            &admin,
            now(),
        )
        .unwrap();
        assert_eq!(result.event.approval_status, ApprovalStatus::Rejected);
        assert_eq!(result.event.approved_at, None);

        for status in [ApprovalStatus::Approved, ApprovalStatus::Rejected] {
            let err =
                moderate(&sample_event(status), Operation::Reject, &admin, now()).unwrap_err();
            assert!(matches!(
                err,
                EventError::InvalidTransition {
                    id: 42,
                    operation: Operation::Reject,
                    status: s,
                } if s == status
            ));
        }
    }

    #[test]
    fn test_restore_only_from_rejected() {
        let admin = Actor::admin("admin");
        let result = moderate(
            &sample_event(ApprovalStatus::Rejected),
            Operation::Restore,
            &admin,
            now(),
        )
        .unwrap();
        assert_eq!(result.event.approval_status, ApprovalStatus::Pending);
        assert_eq!(result.event.approved_at, None);
        assert_eq!(result.event.approved_by_id, None);

        for status in [ApprovalStatus::Pending, ApprovalStatus::Approved] {
            assert!(moderate(&sample_event(status), Operation::Restore, &admin, now()).is_err());
        }
    }

    #[test]
    fn test_approve_rejected_requires_rejected_source() {
        let admin = Actor::admin("admin");
        assert!(moderate(
            &sample_event(ApprovalStatus::Rejected),
            Operation::ApproveRejected,
            &admin,
            now()
        )
        .is_ok());
        assert!(moderate(
            &sample_event(ApprovalStatus::Pending),
            Operation::ApproveRejected,
            &admin,
            now()
        )
        .is_err());
    }

    #[test]
    fn test_non_admin_cannot_moderate() {
        let user = Actor::user("owner");
        let err = moderate(
            &sample_event(ApprovalStatus::Pending),
            Operation::Approve,
            &user,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, EventError::Forbidden(_)));
    }

    #[test]
    fn test_visibility() {
        let admin = Actor::admin("admin");
        let owner = Actor::user("owner");
        let stranger = Actor::user("stranger");

        for status in [ApprovalStatus::Pending, ApprovalStatus::Rejected] {
            let event = sample_event(status);
            assert!(!can_view(&event, None));
            assert!(!can_view(&event, Some(&stranger)));
            assert!(can_view(&event, Some(&owner)));
            assert!(can_view(&event, Some(&admin)));
        }

        let approved = sample_event(ApprovalStatus::Approved);
        assert!(can_view(&approved, None));
        assert!(can_view(&approved, Some(&stranger)));
    }

    #[test]
    fn test_register_respects_capacity() {
        let mut event = sample_event(ApprovalStatus::Approved);
        event.registered_count = 1;

        let event = register(&event).unwrap();
        assert_eq!(event.registered_count, 2);

        let err = register(&event).unwrap_err();
        assert!(matches!(err, EventError::SoldOut { id: 42, capacity: 2 }));
    }

    #[test]
    fn test_register_unlimited_capacity() {
        let mut event = sample_event(ApprovalStatus::Approved);
        event.ticket_capacity = None;
        event.registered_count = 10_000;
        assert_eq!(register(&event).unwrap().registered_count, 10_001);
    }

    #[test]
    fn test_register_unlimited_capacity_stops_at_counter_limit() {
        let mut event = sample_event(ApprovalStatus::Approved);
        event.ticket_capacity = None;
        event.registered_count = i32::MAX;

        let err = register(&event).unwrap_err();
        assert!(matches!(
            err,
            EventError::SoldOut {
                id: 42,
                capacity: i32::MAX
            }
        ));
    }

    #[test]
    fn test_register_requires_approval() {
        for status in [ApprovalStatus::Pending, ApprovalStatus::Rejected] {
            let err = register(&sample_event(status)).unwrap_err();
            assert!(matches!(err, EventError::RegistrationClosed { .. }));
        }
    }

    #[test]
    fn test_edit_by_owner_while_pending() {
        let owner = Actor::user("owner");
        assert!(check_edit(&sample_event(ApprovalStatus::Pending), &owner).is_ok());
        assert!(matches!(
            check_edit(&sample_event(ApprovalStatus::Approved), &owner),
            Err(EventError::InvalidTransition { operation: Operation::Edit, .. })
        ));
        assert!(matches!(
            check_edit(&sample_event(ApprovalStatus::Pending), &Actor::admin("admin")),
            Err(EventError::Forbidden(_))
        ));
    }
}
