//! Content Store: posts and the comments attached to them.
//!
//! Posts carry a denormalized `comment_count` that must equal the number of
//! live comments referencing the post at every point a client can observe.
//! The rules that keep it honest:
//!   - count adjustments are atomic SQL expressions, never read-modify-write
//!   - comment create/delete and the matching adjustment share a transaction
//!   - post edits never touch the count (the column is simply absent from
//!     the UPDATE list)
//!   - post deletion removes the comments and the post in one transaction,
//!     children first

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{Comment, Post};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("post not found")]
    PostNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Optional constraints for the post listing; both, either, or neither apply.
#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub category: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ContentService {
    pool: PgPool,
}

impl ContentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_post(
        &self,
        owner: &str,
        category: Option<String>,
        group_id: Option<Uuid>,
        title: &str,
        description: &str,
    ) -> Result<Post, ContentError> {
        // No field validation here: empty titles and descriptions are
        // accepted, the boundary decides what to reject.
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (username, category, group_id, title, description, comment_count) \
             VALUES ($1, $2, $3, $4, $5, 0) \
             RETURNING *",
        )
        .bind(owner)
        .bind(category)
        .bind(group_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn find_post(&self, id: Uuid) -> Result<Option<Post>, ContentError> {
        let mut post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(post) = post.as_mut() {
            post.set_time_ago();
        }
        Ok(post)
    }

    /// Posts matching the filter, newest first, annotated with their age.
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, ContentError> {
        let mut posts = match (&filter.category, &filter.group_id) {
            (Some(category), Some(group_id)) => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts WHERE category = $1 AND group_id = $2 \
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(category)
                .bind(group_id)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(category), None) => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts WHERE category = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(group_id)) => {
                sqlx::query_as::<_, Post>(
                    "SELECT * FROM posts WHERE group_id = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(group_id)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        for post in &mut posts {
            post.set_time_ago();
        }
        Ok(posts)
    }

    pub async fn list_posts_by_username(&self, username: &str) -> Result<Vec<Post>, ContentError> {
        let mut posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE username = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        for post in &mut posts {
            post.set_time_ago();
        }
        Ok(posts)
    }

    /// Full replace of the mutable fields. `comment_count` is not in the
    /// column list, so it survives the edit untouched; recomputing it via a
    /// second read would race with concurrent comment creation.
    pub async fn update_post(
        &self,
        id: Uuid,
        owner: &str,
        category: Option<String>,
        group_id: Option<Uuid>,
        title: &str,
        description: &str,
    ) -> Result<(), ContentError> {
        let result = sqlx::query(
            "UPDATE posts SET username = $2, category = $3, group_id = $4, \
             title = $5, description = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(owner)
        .bind(category)
        .bind(group_id)
        .bind(title)
        .bind(description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::PostNotFound);
        }
        Ok(())
    }

    /// Cascade delete: comments first, then the post, in one transaction.
    pub async fn delete_post(&self, id: Uuid) -> Result<(), ContentError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Rolls back the comment deletion too.
            return Err(ContentError::PostNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Insert a comment and bump the owning post's count as a paired unit.
    /// The increment runs first: if the post is gone the whole operation
    /// fails without leaving an orphan comment behind.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        text: &str,
        author: &str,
    ) -> Result<Comment, ContentError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        if bumped.rows_affected() == 0 {
            return Err(ContentError::PostNotFound);
        }

        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (post_id, text, username) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(post_id)
        .bind(text)
        .bind(author)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment)
    }

    pub async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, ContentError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    pub async fn update_comment(&self, id: Uuid, text: &str) -> Result<(), ContentError> {
        let result = sqlx::query("UPDATE comments SET text = $2 WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::CommentNotFound);
        }
        Ok(())
    }

    /// Remove a comment and decrement the owning post's count as a paired
    /// unit. The delete runs first and returns the row, so racing deletes of
    /// the same comment settle the counter exactly once: whoever loses the
    /// race gets no row back and never reaches the decrement. The decrement
    /// is clamped at zero: if the parent post has already gone (tolerable
    /// during a crashed cascade) the delete still proceeds.
    pub async fn delete_comment(&self, id: Uuid) -> Result<Comment, ContentError> {
        let mut tx = self.pool.begin().await?;

        let comment =
            sqlx::query_as::<_, Comment>("DELETE FROM comments WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ContentError::CommentNotFound)?;

        sqlx::query(
            "UPDATE posts SET comment_count = GREATEST(comment_count - 1, 0) WHERE id = $1",
        )
        .bind(comment.post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(comment)
    }

    pub async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ContentError> {
        let mut comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        for comment in &mut comments {
            comment.set_time_ago();
        }
        Ok(comments)
    }
}
