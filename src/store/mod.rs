//! Event and profile persistence.
//!
//! Event stores provide per-record atomic writes guarded by the `version`
//! row token. There is no cross-record locking.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryEventStore, MemoryProfileStore};
pub use postgres::{PgEventStore, PgProfileStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ApprovalStatus, Event, NewEvent, StatusCounts, UserProfile};
use crate::moderation::EventError;
use crate::profiles::ProfileError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventOrder {
    /// Soonest first.
    #[default]
    StartsAtAsc,
    /// Most recently submitted first.
    CreatedAtDesc,
}

/// Filter for listing events. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub status: Option<ApprovalStatus>,
    pub created_by: Option<String>,
    pub starts_from: Option<DateTime<Utc>>,
    pub order: EventOrder,
    pub limit: Option<i64>,
}

impl EventQuery {
    pub fn with_status(status: ApprovalStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn order(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.status.map_or(true, |s| event.approval_status == s)
            && self
                .created_by
                .as_deref()
                .map_or(true, |owner| event.created_by_id == owner)
            && self.starts_from.map_or(true, |from| event.starts_at >= from)
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new pending event and returns it with its id.
    async fn insert(&self, event: NewEvent) -> Result<Event, EventError>;

    async fn get(&self, id: i32) -> Result<Option<Event>, EventError>;

    /// Writes `event` if the stored row still has `event.version`, bumping
    /// the version. Fails with `ConcurrencyConflict` otherwise.
    async fn update(&self, event: &Event) -> Result<Event, EventError>;

    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, EventError>;

    /// Status counts, with the weekly figures measured from `since`.
    async fn counts(&self, since: DateTime<Utc>) -> Result<StatusCounts, EventError>;
}

/// One profile per actor id. Profiles have a single writer, their owner,
/// so saves are plain upserts.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the profile for `user_id`, creating a default one stamped
    /// with `now` if there is none yet.
    async fn get_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ProfileError>;

    /// Writes the editable fields and `updated_at`. `created_at` is kept.
    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, ProfileError>;
}
