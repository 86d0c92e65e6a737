use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::{can_view, check_edit, moderate, register, EventError, Operation};
use crate::models::{
    Actor, ApprovalStatus, DashboardStats, Event, EventDraft, NewEvent, ValidationErrors,
};
use crate::store::{EventOrder, EventQuery, EventStore};

const DASHBOARD_LIST_LEN: i64 = 8;

/// Result of a moderation request. `changed` is false for the
/// already-approved no-op.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionResult {
    pub event: Event,
    pub changed: bool,
}

/// Event operations on behalf of an explicit actor.
///
/// Each write is a single read, check, compare-and-swap against one record.
/// Conflicts are returned to the caller; nothing is retried here.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    async fn load(&self, id: i32, expected_version: Option<i32>) -> Result<Event, EventError> {
        let event = self
            .store
            .get(id)
            .await?
            .ok_or(EventError::NotFound { id })?;

        match expected_version {
            Some(version) if version != event.version => Err(EventError::ConcurrencyConflict {
                id,
                status: event.approval_status,
            }),
            _ => Ok(event),
        }
    }

    pub async fn submit(&self, actor: &Actor, draft: EventDraft) -> Result<Event, EventError> {
        let draft = draft.normalized();
        draft.validate().map_err(EventError::Validation)?;

        let event = self
            .store
            .insert(NewEvent {
                draft,
                created_by_id: actor.id.clone(),
                created_at: Utc::now(),
            })
            .await?;

        info!(event_id = event.id, actor = %actor.id, "Event submitted for approval");
        Ok(event)
    }

    /// Replaces the content of a pending event owned by `actor`.
    pub async fn edit(
        &self,
        actor: &Actor,
        id: i32,
        draft: EventDraft,
        expected_version: Option<i32>,
    ) -> Result<Event, EventError> {
        let current = self.load(id, expected_version).await?;
        check_edit(&current, actor)?;

        let draft = draft.normalized();
        draft.validate().map_err(EventError::Validation)?;
        if let Some(capacity) = draft.ticket_capacity {
            if current.registered_count > capacity {
                return Err(EventError::Validation(ValidationErrors::single(
                    "ticket_capacity",
                    format!(
                        "Capacity cannot be below the {} existing registrations.",
                        current.registered_count
                    ),
                )));
            }
        }

        let mut next = current.clone();
        next.title = draft.title;
        next.description = draft.description;
        next.starts_at = draft.starts_at;
        next.ends_at = draft.ends_at;
        next.location = draft.location;
        next.is_online = draft.is_online;
        next.price = draft.price;
        next.image_path = draft.image_path;
        next.ticket_capacity = draft.ticket_capacity;

        let saved = self.store.update(&next).await?;
        info!(event_id = id, actor = %actor.id, "Event edited");
        Ok(saved)
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: i32,
        operation: Operation,
        expected_version: Option<i32>,
    ) -> Result<TransitionResult, EventError> {
        let current = self.load(id, expected_version).await?;
        let moderated = moderate(&current, operation, actor, Utc::now())?;

        if !moderated.changed {
            info!(event_id = id, actor = %actor.id, "Event already approved");
            return Ok(TransitionResult {
                event: moderated.event,
                changed: false,
            });
        }

        let saved = self.store.update(&moderated.event).await?;
        info!(
            event_id = id,
            actor = %actor.id,
            from = %current.approval_status,
            to = %saved.approval_status,
            "Event {}",
            operation
        );
        Ok(TransitionResult {
            event: saved,
            changed: true,
        })
    }

    pub async fn approve(
        &self,
        actor: &Actor,
        id: i32,
        expected_version: Option<i32>,
    ) -> Result<TransitionResult, EventError> {
        self.transition(actor, id, Operation::Approve, expected_version)
            .await
    }

    pub async fn approve_rejected(
        &self,
        actor: &Actor,
        id: i32,
        expected_version: Option<i32>,
    ) -> Result<TransitionResult, EventError> {
        self.transition(actor, id, Operation::ApproveRejected, expected_version)
            .await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        id: i32,
        expected_version: Option<i32>,
    ) -> Result<TransitionResult, EventError> {
        self.transition(actor, id, Operation::Reject, expected_version)
            .await
    }

    pub async fn restore(
        &self,
        actor: &Actor,
        id: i32,
        expected_version: Option<i32>,
    ) -> Result<TransitionResult, EventError> {
        self.transition(actor, id, Operation::Restore, expected_version)
            .await
    }

    /// Takes one ticket. Two concurrent registrations for the last seat
    /// cannot both commit: the loser gets `ConcurrencyConflict`.
    pub async fn register(&self, actor: &Actor, id: i32) -> Result<Event, EventError> {
        let current = self.load(id, None).await?;
        let next = register(&current)?;
        let saved = self.store.update(&next).await?;

        info!(
            event_id = id,
            actor = %actor.id,
            registered = saved.registered_count,
            "Registration recorded"
        );
        Ok(saved)
    }

    /// Looks up an event, hiding it unless `actor` may see it.
    pub async fn get_visible(&self, actor: Option<&Actor>, id: i32) -> Result<Event, EventError> {
        match self.store.get(id).await? {
            Some(event) if can_view(&event, actor) => Ok(event),
            _ => Err(EventError::NotFound { id }),
        }
    }

    pub async fn list_public(&self) -> Result<Vec<Event>, EventError> {
        self.store
            .list(&EventQuery::with_status(ApprovalStatus::Approved))
            .await
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Event>, EventError> {
        let query = EventQuery {
            created_by: Some(actor.id.clone()),
            order: EventOrder::CreatedAtDesc,
            ..Default::default()
        };
        self.store.list(&query).await
    }

    fn require_admin(actor: &Actor) -> Result<(), EventError> {
        if actor.is_admin {
            Ok(())
        } else {
            Err(EventError::Forbidden(
                "Administrator role required".to_string(),
            ))
        }
    }

    pub async fn list_pending(&self, actor: &Actor) -> Result<Vec<Event>, EventError> {
        Self::require_admin(actor)?;
        self.store
            .list(&EventQuery::with_status(ApprovalStatus::Pending))
            .await
    }

    pub async fn list_rejected(&self, actor: &Actor) -> Result<Vec<Event>, EventError> {
        Self::require_admin(actor)?;
        let query =
            EventQuery::with_status(ApprovalStatus::Rejected).order(EventOrder::CreatedAtDesc);
        self.store.list(&query).await
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<DashboardStats, EventError> {
        Self::require_admin(actor)?;

        let now = Utc::now();
        let counts = self.store.counts(now - Duration::days(7)).await?;
        let latest = self
            .store
            .list(
                &EventQuery::default()
                    .order(EventOrder::CreatedAtDesc)
                    .limit(DASHBOARD_LIST_LEN),
            )
            .await?;
        let upcoming_approved = self
            .store
            .list(&EventQuery {
                status: Some(ApprovalStatus::Approved),
                starts_from: Some(now),
                order: EventOrder::StartsAtAsc,
                limit: Some(DASHBOARD_LIST_LEN),
                ..Default::default()
            })
            .await?;

        Ok(DashboardStats {
            counts,
            latest,
            upcoming_approved,
        })
    }
}
