use std::sync::Arc;

use crate::moderation::EventService;
use crate::profiles::ProfileService;
use crate::store::{EventStore, ProfileStore};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub profiles: ProfileService,
}

impl AppState {
    pub fn new(events: Arc<dyn EventStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            events: EventService::new(events),
            profiles: ProfileService::new(profiles),
        }
    }
}
