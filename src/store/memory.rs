use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{EventOrder, EventQuery, EventStore, ProfileStore};
use crate::models::{ApprovalStatus, Event, NewEvent, StatusCounts, UserProfile};
use crate::moderation::EventError;
use crate::profiles::ProfileError;

#[derive(Default)]
struct State {
    next_id: i32,
    events: BTreeMap<i32, Event>,
}

/// In-process store with the same compare-and-swap semantics as
/// [`PgEventStore`](super::PgEventStore).
#[derive(Default)]
pub struct MemoryEventStore {
    state: RwLock<State>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, new: NewEvent) -> Result<Event, EventError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;

        let draft = new.draft;
        let event = Event {
            id,
            title: draft.title,
            description: draft.description,
            starts_at: draft.starts_at,
            ends_at: draft.ends_at,
            location: draft.location,
            is_online: draft.is_online,
            price: draft.price,
            image_path: draft.image_path,
            ticket_capacity: draft.ticket_capacity,
            registered_count: 0,
            created_by_id: new.created_by_id,
            approval_status: ApprovalStatus::Pending,
            created_at: new.created_at,
            approved_at: None,
            approved_by_id: None,
            version: 0,
        };
        state.events.insert(id, event.clone());
        Ok(event)
    }

    async fn get(&self, id: i32) -> Result<Option<Event>, EventError> {
        Ok(self.state.read().await.events.get(&id).cloned())
    }

    async fn update(&self, event: &Event) -> Result<Event, EventError> {
        let mut state = self.state.write().await;
        let stored = state
            .events
            .get_mut(&event.id)
            .ok_or(EventError::NotFound { id: event.id })?;

        if stored.version != event.version {
            return Err(EventError::ConcurrencyConflict {
                id: event.id,
                status: stored.approval_status,
            });
        }

        let mut next = event.clone();
        next.version += 1;
        // Identity, ownership and creation time are write-once.
        next.created_by_id = stored.created_by_id.clone();
        next.created_at = stored.created_at;
        *stored = next.clone();
        Ok(next)
    }

    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, EventError> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();

        match query.order {
            EventOrder::StartsAtAsc => events.sort_by_key(|e| (e.starts_at, e.id)),
            EventOrder::CreatedAtDesc => {
                events.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
            }
        }
        if let Some(limit) = query.limit {
            events.truncate(limit.max(0) as usize);
        }
        Ok(events)
    }

    async fn counts(&self, since: DateTime<Utc>) -> Result<StatusCounts, EventError> {
        let state = self.state.read().await;
        let mut counts = StatusCounts::default();
        for event in state.events.values() {
            counts.total += 1;
            match event.approval_status {
                ApprovalStatus::Pending => counts.pending += 1,
                ApprovalStatus::Approved => counts.approved += 1,
                ApprovalStatus::Rejected => counts.rejected += 1,
            }
            if event.created_at >= since {
                counts.new_this_week += 1;
            }
            if event.approval_status == ApprovalStatus::Approved
                && event.approved_at.map_or(false, |at| at >= since)
            {
                counts.approved_this_week += 1;
            }
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ProfileError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id, now));
        Ok(profile.clone())
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, ProfileError> {
        let mut profiles = self.profiles.write().await;
        let mut next = profile.clone();
        if let Some(stored) = profiles.get(&profile.user_id) {
            next.created_at = stored.created_at;
        }
        profiles.insert(next.user_id.clone(), next.clone());
        Ok(next)
    }
}
