//! Group Registry: tutor-led cohorts and their membership.
//!
//! Membership has set semantics on top of a text[] column: adds are guarded
//! against duplicates, removals strip every occurrence. Deleting a group
//! cascades to every post scoped to it (and, through those posts, their
//! comments) in a single transaction.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::Group;
use crate::policy::{GroupScope, Principal};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group not found")]
    GroupNotFound,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Groups visible to the principal, per the access policy: admins see
    /// all, tutors their own, students the ones they belong to, roleless
    /// accounts none.
    pub async fn list_groups_for(&self, principal: &Principal) -> Result<Vec<Group>, GroupError> {
        let groups = match crate::policy::group_scope(principal) {
            GroupScope::All => {
                sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY created_at DESC, id DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
            GroupScope::TutorOf(username) => {
                sqlx::query_as::<_, Group>(
                    "SELECT * FROM groups WHERE tutor = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(username)
                .fetch_all(&self.pool)
                .await?
            }
            GroupScope::MemberOf(username) => {
                sqlx::query_as::<_, Group>(
                    "SELECT * FROM groups WHERE students @> ARRAY[$1] \
                     ORDER BY created_at DESC, id DESC",
                )
                .bind(username)
                .fetch_all(&self.pool)
                .await?
            }
            GroupScope::Nothing => Vec::new(),
        };

        Ok(groups)
    }

    pub async fn find_group(&self, id: Uuid) -> Result<Option<Group>, GroupError> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    pub async fn create_group(
        &self,
        tutor: &str,
        provider: Option<String>,
        level: Option<String>,
        year: Option<String>,
        weekday: Option<String>,
    ) -> Result<Group, GroupError> {
        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (tutor, provider, level, year, weekday, students) \
             VALUES ($1, $2, $3, $4, $5, '{}') \
             RETURNING *",
        )
        .bind(tutor)
        .bind(provider)
        .bind(level)
        .bind(year)
        .bind(weekday)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Full replace of the scalar fields; membership is only ever mutated
    /// through add_student/remove_student.
    pub async fn update_group(
        &self,
        id: Uuid,
        tutor: &str,
        provider: Option<String>,
        level: Option<String>,
        year: Option<String>,
        weekday: Option<String>,
    ) -> Result<(), GroupError> {
        let result = sqlx::query(
            "UPDATE groups SET tutor = $2, provider = $3, level = $4, year = $5, weekday = $6 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(tutor)
        .bind(provider)
        .bind(level)
        .bind(year)
        .bind(weekday)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GroupError::GroupNotFound);
        }
        Ok(())
    }

    /// Idempotent set-add: the guard keeps a username from appearing twice
    /// even when concurrent requests race on the same group.
    pub async fn add_student(&self, group_id: Uuid, username: &str) -> Result<(), GroupError> {
        sqlx::query(
            "UPDATE groups SET students = array_append(students, $2) \
             WHERE id = $1 AND NOT (students @> ARRAY[$2])",
        )
        .bind(group_id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        // Zero rows means either "already a member" (fine) or "no such
        // group"; callers resolve the group before mutating membership.
        Ok(())
    }

    /// Idempotent set-remove; strips every occurrence of the username.
    pub async fn remove_student(&self, group_id: Uuid, username: &str) -> Result<(), GroupError> {
        sqlx::query("UPDATE groups SET students = array_remove(students, $2) WHERE id = $1")
            .bind(group_id)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a group and everything scoped to it: comments on the group's
    /// posts, then the posts, then the group itself - children before
    /// parents, all inside one transaction.
    pub async fn delete_group(&self, id: Uuid) -> Result<(), GroupError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM comments WHERE post_id IN (SELECT id FROM posts WHERE group_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GroupError::GroupNotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
