/// Task assignment model
///
/// Assignments are the join entity between tasks and users: being assigned
/// grants a user read access to a task without any write rights. Only the
/// task owner creates and removes assignments; the owner may also appear
/// as an assignee (not prevented).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_assignments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Assignment of a user to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskAssignment {
    /// Unique assignment ID
    pub id: Uuid,

    /// Task being assigned
    pub task_id: Uuid,

    /// User gaining read access
    pub user_id: Uuid,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,
}

/// Assignment joined with the assignee's public summary
///
/// Flat row shape for the join query; the API layer folds this into its
/// response view.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentWithUser {
    /// Assignment ID
    pub id: Uuid,

    /// Task being assigned
    pub task_id: Uuid,

    /// Assignee user ID
    pub user_id: Uuid,

    /// When the assignment was created
    pub created_at: DateTime<Utc>,

    /// Assignee email
    pub email: String,

    /// Assignee username
    pub username: String,

    /// Assignee display name
    pub name: Option<String>,
}

impl AssignmentWithUser {
    /// Splits the row into the assignment and the assignee summary
    pub fn into_parts(self) -> (TaskAssignment, UserSummary) {
        (
            TaskAssignment {
                id: self.id,
                task_id: self.task_id,
                user_id: self.user_id,
                created_at: self.created_at,
            },
            UserSummary {
                id: self.user_id,
                email: self.email,
                username: self.username,
                name: self.name,
            },
        )
    }
}

impl TaskAssignment {
    /// Creates an assignment
    ///
    /// # Errors
    ///
    /// Returns an error if the task or user does not exist (foreign key)
    /// or the pair is already assigned (unique constraint).
    pub async fn create(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let assignment = sqlx::query_as::<_, TaskAssignment>(
            r#"
            INSERT INTO task_assignments (task_id, user_id)
            VALUES ($1, $2)
            RETURNING id, task_id, user_id, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(assignment)
    }

    /// Lists the assignee user IDs for a task
    ///
    /// This is the assignment half of the authorization snapshot: read
    /// access is granted to the owner plus this set.
    pub async fn assignee_ids(pool: &PgPool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM task_assignments
            WHERE task_id = $1
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Lists a task's assignments joined with assignee summaries
    pub async fn list_with_users(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<AssignmentWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentWithUser>(
            r#"
            SELECT a.id, a.task_id, a.user_id, a.created_at,
                   u.email, u.username, u.name
            FROM task_assignments a
            JOIN users u ON u.id = a.user_id
            WHERE a.task_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Removes a user's assignment from a task
    ///
    /// Idempotent: removing an assignment that doesn't exist is not an
    /// error.
    ///
    /// # Returns
    ///
    /// Number of assignments removed (0 or 1 given the unique constraint)
    pub async fn delete_by_task_and_user(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM task_assignments
            WHERE task_id = $1 AND user_id = $2
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
