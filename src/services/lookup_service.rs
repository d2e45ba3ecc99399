//! Reference data backing the form-facing pages: categories for posts,
//! levels/providers for groups and profiles, the role list for user admin.

use sqlx::PgPool;

use crate::database::models::Lookup;

#[derive(Clone)]
pub struct LookupService {
    pool: PgPool,
}

impl LookupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn categories(&self) -> Result<Vec<Lookup>, sqlx::Error> {
        self.all("categories").await
    }

    pub async fn levels(&self) -> Result<Vec<Lookup>, sqlx::Error> {
        self.all("levels").await
    }

    pub async fn providers(&self) -> Result<Vec<Lookup>, sqlx::Error> {
        self.all("providers").await
    }

    pub async fn roles(&self) -> Result<Vec<Lookup>, sqlx::Error> {
        self.all("roles").await
    }

    async fn all(&self, table: &str) -> Result<Vec<Lookup>, sqlx::Error> {
        // `table` is one of the four fixed names above, never user input.
        let sql = format!("SELECT * FROM {} ORDER BY name ASC", table);
        sqlx::query_as::<_, Lookup>(&sql).fetch_all(&self.pool).await
    }
}
