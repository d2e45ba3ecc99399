use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::age::humanize_age;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub username: String,
    pub category: Option<String>,
    pub group_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    /// Display-only age annotation derived from created_at, not stored.
    #[sqlx(default)]
    pub time_ago: Option<String>,
}

impl Post {
    pub fn set_time_ago(&mut self) {
        self.time_ago = Some(humanize_age(Utc::now() - self.created_at));
    }
}
