use serde::Serialize;
use sqlx::FromRow;

use super::event::Event;

/// Status counts over the whole event table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub new_this_week: i64,
    pub approved_this_week: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub latest: Vec<Event>,
    pub upcoming_approved: Vec<Event>,
}
