//! Identity Store: user records, credential verification, and the
//! account-deletion cascade.
//!
//! Usernames are case-normalized to lowercase at every write and lookup.
//! Passwords are stored as salted argon2 hashes, never plaintext.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::user::normalize_username;
use crate::database::models::{Role, User};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user not found")]
    UserNotFound,

    #[error("username already exists")]
    UsernameTaken,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(normalize_username(username))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, IdentityError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Create an account with the configured default role.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> Result<User, IdentityError> {
        let username = normalize_username(username);
        let password_hash = hash_password(password)?;
        let default_role = &config::config().security.default_role;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, role, email) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(default_role)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => IdentityError::UsernameTaken,
            _ => IdentityError::Storage(e),
        })?;

        Ok(user)
    }

    pub fn verify_password(&self, user: &User, supplied: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&user.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(supplied.as_bytes(), &parsed)
            .is_ok()
    }

    pub async fn update_profile(
        &self,
        username: &str,
        email: Option<String>,
        level: Option<String>,
        provider: Option<String>,
        location: Option<String>,
        bio: Option<String>,
    ) -> Result<(), IdentityError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, level = $3, provider = $4, location = $5, bio = $6 \
             WHERE username = $1",
        )
        .bind(normalize_username(username))
        .bind(email)
        .bind(level)
        .bind(provider)
        .bind(location)
        .bind(bio)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }

    pub async fn set_role(&self, username: &str, role: Role) -> Result<(), IdentityError> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE username = $1")
            .bind(normalize_username(username))
            .bind(role.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }

    /// Re-hash on every password change.
    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<(), IdentityError> {
        let password_hash = hash_password(new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE username = $1")
            .bind(normalize_username(username))
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }

    /// Password reset lands here with a verified token payload (an email).
    pub async fn set_password_by_email(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<User, IdentityError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(IdentityError::UserNotFound)?;
        self.set_password(&user.username, new_password).await?;
        Ok(user)
    }

    /// Account deletion cascade. There is no cross-table foreign key doing
    /// this for us, so the sequence is strictly ordered children-first and
    /// wrapped in one transaction:
    ///   1. settle the user's comments (decrement each affected post's
    ///      counter by the user's share, then delete the comments)
    ///   2. the user's posts, comments first
    ///   3. every group the user tutors, with that group's posts and their
    ///      comments
    ///   4. the user record itself
    pub async fn delete_user(&self, username: &str) -> Result<(), IdentityError> {
        let username = normalize_username(username);
        let mut tx = self.pool.begin().await?;

        // 1. Comments authored by the user, wherever they live.
        sqlx::query(
            "UPDATE posts p SET comment_count = GREATEST(p.comment_count - c.n, 0) \
             FROM (SELECT post_id, COUNT(*)::int AS n FROM comments WHERE username = $1 \
                   GROUP BY post_id) c \
             WHERE p.id = c.post_id",
        )
        .bind(&username)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM comments WHERE username = $1")
            .bind(&username)
            .execute(&mut *tx)
            .await?;

        // 2. Posts authored by the user, their comments first.
        sqlx::query(
            "DELETE FROM comments WHERE post_id IN (SELECT id FROM posts WHERE username = $1)",
        )
        .bind(&username)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE username = $1")
            .bind(&username)
            .execute(&mut *tx)
            .await?;

        // 3. Groups tutored by the user, cascading through their posts.
        sqlx::query(
            "DELETE FROM comments WHERE post_id IN \
             (SELECT id FROM posts WHERE group_id IN (SELECT id FROM groups WHERE tutor = $1))",
        )
        .bind(&username)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM posts WHERE group_id IN (SELECT id FROM groups WHERE tutor = $1)",
        )
        .bind(&username)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM groups WHERE tutor = $1")
            .bind(&username)
            .execute(&mut *tx)
            .await?;

        // Strip the username from any remaining member lists.
        sqlx::query("UPDATE groups SET students = array_remove(students, $1)")
            .bind(&username)
            .execute(&mut *tx)
            .await?;

        // 4. The user record.
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(&username)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(Argon2::default()
            .verify_password(b"correct horse battery staple", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong password", &parsed)
            .is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }
}
