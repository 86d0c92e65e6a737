use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::validation::{check_len, trimmed, ValidationErrors};

pub const TITLE_MAX_LEN: usize = 160;
pub const DESCRIPTION_MAX_LEN: usize = 4000;
pub const LOCATION_MAX_LEN: usize = 200;
pub const IMAGE_PATH_MAX_LEN: usize = 512;
pub const PRICE_MAX: i64 = 999_999;
pub const CAPACITY_MAX: i32 = 100_000;
/// Decimal places kept by the `NUMERIC(10, 2)` price column.
pub const PRICE_SCALE: u32 = 2;

/// Moderation state of an event. Stored as a SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ApprovalStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
    pub is_online: bool,
    pub price: Decimal,
    pub image_path: Option<String>,
    /// `None` means unlimited.
    pub ticket_capacity: Option<i32>,
    pub registered_count: i32,
    pub created_by_id: String,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by_id: Option<String>,
    /// Row token for optimistic concurrency, bumped by the store on every write.
    pub version: i32,
}

impl Event {
    pub fn is_full(&self) -> bool {
        matches!(self.ticket_capacity, Some(capacity) if self.registered_count >= capacity)
    }

    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.created_by_id == actor_id
    }
}

/// Submitter-controlled content of an event.
///
/// Ownership, moderation and audit fields are server-set and never bound
/// from client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub ticket_capacity: Option<i32>,
}

/// A validated draft ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub draft: EventDraft,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
}

impl EventDraft {
    /// Trims free text and turns blank optional fields into `None`.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = trimmed(self.location);
        self.image_path = trimmed(self.image_path);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_len(&mut errors, "title", &self.title, TITLE_MAX_LEN, true);
        check_len(
            &mut errors,
            "description",
            &self.description,
            DESCRIPTION_MAX_LEN,
            true,
        );
        if let Some(location) = &self.location {
            check_len(&mut errors, "location", location, LOCATION_MAX_LEN, false);
        }
        if let Some(path) = &self.image_path {
            check_len(&mut errors, "image_path", path, IMAGE_PATH_MAX_LEN, false);
        }

        if self.ends_at <= self.starts_at {
            errors.add("ends_at", "End time must be after start time.");
        }

        if self.price < Decimal::ZERO || self.price > Decimal::from(PRICE_MAX) {
            errors.add(
                "price",
                format!("price must be between 0 and {}.", PRICE_MAX),
            );
        } else if self.price.normalize().scale() > PRICE_SCALE {
            errors.add(
                "price",
                format!("price can have at most {} decimal places.", PRICE_SCALE),
            );
        }

        match self.ticket_capacity {
            Some(capacity) if capacity < 0 => {
                errors.add("ticket_capacity", "Capacity cannot be negative.");
            }
            Some(capacity) if capacity > CAPACITY_MAX => {
                errors.add(
                    "ticket_capacity",
                    format!("Capacity cannot exceed {}.", CAPACITY_MAX),
                );
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
