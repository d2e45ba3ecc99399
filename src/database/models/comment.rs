use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::age::humanize_age;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    /// Display-only age annotation derived from created_at, not stored.
    #[sqlx(default)]
    pub time_ago: Option<String>,
}

impl Comment {
    pub fn set_time_ago(&mut self) {
        self.time_ago = Some(humanize_age(Utc::now() - self.created_at));
    }
}
