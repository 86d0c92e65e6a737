use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{EventOrder, EventQuery, EventStore, ProfileStore};
use crate::models::profile::DEFAULT_FULL_NAME;
use crate::models::{ApprovalStatus, Event, NewEvent, StatusCounts, UserProfile};
use crate::moderation::EventError;
use crate::profiles::ProfileError;

const EVENT_COLUMNS: &str = "id, title, description, starts_at, ends_at, location, is_online, \
     price, image_path, ticket_capacity, registered_count, created_by_id, approval_status, \
     created_at, approved_at, approved_by_id, version";

const PROFILE_COLUMNS: &str = "user_id, full_name, bio, date_of_birth, gender, phone, website, \
     linkedin, github, country, city, school, college, university, degree, graduation_year, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, new: NewEvent) -> Result<Event, EventError> {
        let draft = new.draft;
        let sql = format!(
            r#"
            INSERT INTO events
                (title, description, starts_at, ends_at, location, is_online, price,
                 image_path, ticket_capacity, registered_count, created_by_id,
                 approval_status, created_at, approved_at, approved_by_id, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11, $12, NULL, NULL, 0)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(draft.starts_at)
            .bind(draft.ends_at)
            .bind(&draft.location)
            .bind(draft.is_online)
            .bind(draft.price)
            .bind(&draft.image_path)
            .bind(draft.ticket_capacity)
            .bind(&new.created_by_id)
            .bind(ApprovalStatus::Pending)
            .bind(new.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    async fn get(&self, id: i32) -> Result<Option<Event>, EventError> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update(&self, event: &Event) -> Result<Event, EventError> {
        let sql = format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                starts_at = $4,
                ends_at = $5,
                location = $6,
                is_online = $7,
                price = $8,
                image_path = $9,
                ticket_capacity = $10,
                registered_count = $11,
                approval_status = $12,
                approved_at = $13,
                approved_by_id = $14,
                version = version + 1
            WHERE id = $1 AND version = $15
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let updated = sqlx::query_as::<_, Event>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.starts_at)
            .bind(event.ends_at)
            .bind(&event.location)
            .bind(event.is_online)
            .bind(event.price)
            .bind(&event.image_path)
            .bind(event.ticket_capacity)
            .bind(event.registered_count)
            .bind(event.approval_status)
            .bind(event.approved_at)
            .bind(&event.approved_by_id)
            .bind(event.version)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(updated) = updated {
            return Ok(updated);
        }

        // Nothing matched: either the row is gone or its version moved on.
        let current: Option<ApprovalStatus> =
            sqlx::query_scalar("SELECT approval_status FROM events WHERE id = $1")
                .bind(event.id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            Some(status) => Err(EventError::ConcurrencyConflict {
                id: event.id,
                status,
            }),
            None => Err(EventError::NotFound { id: event.id }),
        }
    }

    async fn list(&self, query: &EventQuery) -> Result<Vec<Event>, EventError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM events WHERE TRUE", EVENT_COLUMNS));

        if let Some(status) = query.status {
            builder.push(" AND approval_status = ").push_bind(status);
        }
        if let Some(owner) = &query.created_by {
            builder.push(" AND created_by_id = ").push_bind(owner.clone());
        }
        if let Some(from) = query.starts_from {
            builder.push(" AND starts_at >= ").push_bind(from);
        }

        builder.push(match query.order {
            EventOrder::StartsAtAsc => " ORDER BY starts_at ASC, id ASC",
            EventOrder::CreatedAtDesc => " ORDER BY created_at DESC, id DESC",
        });

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit.max(0));
        }

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn counts(&self, since: DateTime<Utc>) -> Result<StatusCounts, EventError> {
        let counts = sqlx::query_as::<_, StatusCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE approval_status = $1) AS pending,
                   COUNT(*) FILTER (WHERE approval_status = $2) AS approved,
                   COUNT(*) FILTER (WHERE approval_status = $3) AS rejected,
                   COUNT(*) FILTER (WHERE created_at >= $4) AS new_this_week,
                   COUNT(*) FILTER (
                       WHERE approval_status = $2 AND approved_at IS NOT NULL AND approved_at >= $4
                   ) AS approved_this_week
            FROM events
            "#,
        )
        .bind(ApprovalStatus::Pending)
        .bind(ApprovalStatus::Approved)
        .bind(ApprovalStatus::Rejected)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_or_create(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ProfileError> {
        // Two first visits may race; the loser's insert is a no-op.
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, full_name, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(DEFAULT_FULL_NAME)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} FROM user_profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        );
        let profile = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, ProfileError> {
        let sql = format!(
            r#"
            INSERT INTO user_profiles ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                bio = EXCLUDED.bio,
                date_of_birth = EXCLUDED.date_of_birth,
                gender = EXCLUDED.gender,
                phone = EXCLUDED.phone,
                website = EXCLUDED.website,
                linkedin = EXCLUDED.linkedin,
                github = EXCLUDED.github,
                country = EXCLUDED.country,
                city = EXCLUDED.city,
                school = EXCLUDED.school,
                college = EXCLUDED.college,
                university = EXCLUDED.university,
                degree = EXCLUDED.degree,
                graduation_year = EXCLUDED.graduation_year,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            PROFILE_COLUMNS, PROFILE_COLUMNS
        );

        let saved = sqlx::query_as::<_, UserProfile>(&sql)
            .bind(&profile.user_id)
            .bind(&profile.full_name)
            .bind(&profile.bio)
            .bind(profile.date_of_birth)
            .bind(&profile.gender)
            .bind(&profile.phone)
            .bind(&profile.website)
            .bind(&profile.linkedin)
            .bind(&profile.github)
            .bind(&profile.country)
            .bind(&profile.city)
            .bind(&profile.school)
            .bind(&profile.college)
            .bind(&profile.university)
            .bind(&profile.degree)
            .bind(profile.graduation_year)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }
}

// These need a live database: `DATABASE_URL=postgres://... cargo test -- --ignored`.
// `sqlx::test` creates a fresh database per test and applies `migrations/`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventDraft;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn new_event(owner: &str) -> NewEvent {
        let starts_at = Utc::now() + Duration::days(14);
        NewEvent {
            draft: EventDraft {
                title: "Regional qualifier".to_string(),
                description: "Three problems, ninety minutes".to_string(),
                starts_at,
                ends_at: starts_at + Duration::minutes(90),
                location: None,
                is_online: true,
                price: Decimal::new(1250, 2),
                image_path: None,
                ticket_capacity: Some(3),
            },
            created_by_id: owner.to_string(),
            created_at: Utc::now(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_update_with_stale_version_conflicts(pool: PgPool) {
        let store = PgEventStore::new(pool);
        let event = store.insert(new_event("u1")).await.unwrap();
        assert_eq!(event.version, 0);
        assert_eq!(event.approval_status, ApprovalStatus::Pending);

        let mut first = event.clone();
        first.approval_status = ApprovalStatus::Rejected;
        let saved = store.update(&first).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut second = event.clone();
        second.title = "Second writer".to_string();
        let err = store.update(&second).await.unwrap_err();
        assert!(matches!(
            err,
            EventError::ConcurrencyConflict {
                status: ApprovalStatus::Rejected,
                ..
            }
        ));

        let stored = store.get(event.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Regional qualifier");
        assert_eq!(stored.version, 1);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_update_missing_event(pool: PgPool) {
        let store = PgEventStore::new(pool);
        let mut ghost = store.insert(new_event("u1")).await.unwrap();
        ghost.id += 1000;

        let err = store.update(&ghost).await.unwrap_err();
        assert!(matches!(err, EventError::NotFound { id } if id == ghost.id));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_profile_created_once_and_saved(pool: PgPool) {
        let store = PgProfileStore::new(pool);
        let first_seen = Utc::now() - Duration::days(3);

        let created = store.get_or_create("u1", first_seen).await.unwrap();
        assert_eq!(created.full_name, DEFAULT_FULL_NAME);

        let again = store.get_or_create("u1", Utc::now()).await.unwrap();
        assert_eq!(again.created_at, created.created_at);

        let mut edited = again.clone();
        edited.full_name = "Ada Byron".to_string();
        edited.graduation_year = Some(2024);
        edited.updated_at = Utc::now();
        let saved = store.save(&edited).await.unwrap();
        assert_eq!(saved.full_name, "Ada Byron");
        assert_eq!(saved.graduation_year, Some(2024));
        assert_eq!(saved.created_at, created.created_at);
    }
}
