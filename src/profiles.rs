//! User profiles, created on first access and edited by their owner.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::models::{Actor, ProfileUpdate, UserProfile, ValidationErrors};
use crate::store::ProfileStore;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// The actor's profile. A default one is created on first access.
    pub async fn get(&self, actor: &Actor) -> Result<UserProfile, ProfileError> {
        self.store.get_or_create(&actor.id, Utc::now()).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfileError> {
        let now = Utc::now();
        let update = update.normalized();
        update
            .validate(now.date_naive())
            .map_err(ProfileError::Validation)?;

        let mut profile = self.store.get_or_create(&actor.id, now).await?;
        profile.apply(update, now);
        let saved = self.store.save(&profile).await?;

        info!(actor = %actor.id, "Profile updated");
        Ok(saved)
    }
}
