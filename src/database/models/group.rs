use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tutor-led cohort. `students` is treated as a set of usernames: the
/// registry guards insertion so duplicates never appear, whatever order
/// concurrent add/remove requests land in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub tutor: String,
    pub provider: Option<String>,
    pub level: Option<String>,
    pub year: Option<String>,
    pub weekday: Option<String>,
    pub students: Vec<String>,
    pub created_at: DateTime<Utc>,
}
