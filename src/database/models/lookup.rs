use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row shape shared by the reference-data tables
/// (categories, levels, providers, roles).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lookup {
    pub id: Uuid,
    pub name: String,
}
