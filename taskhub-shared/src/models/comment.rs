/// Comment model
///
/// Comments attach free-form text to a task. Any authenticated user may
/// comment on any task; only the comment's author may delete it, and task
/// ownership grants no rights over other people's comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     content TEXT NOT NULL CHECK (content <> ''),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::UserSummary;

/// Comment on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    /// Unique comment ID
    pub id: Uuid,

    /// Comment body (never empty)
    pub content: String,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Authoring user, sole holder of delete rights
    pub user_id: Uuid,

    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's public summary
///
/// The author columns are nullable at the SQL level (LEFT JOIN) so a
/// dangling author degrades to "no associated user" instead of failing
/// the listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthor {
    /// Comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Authoring user ID
    pub user_id: Uuid,

    /// When the comment was created
    pub created_at: DateTime<Utc>,

    /// Author email, if the author still resolves
    pub email: Option<String>,

    /// Author username, if the author still resolves
    pub username: Option<String>,

    /// Author display name
    pub name: Option<String>,
}

impl CommentWithAuthor {
    /// Splits the row into the comment and the author summary (if any)
    pub fn into_parts(self) -> (Comment, Option<UserSummary>) {
        let author = match (self.email, self.username) {
            (Some(email), Some(username)) => Some(UserSummary {
                id: self.user_id,
                email,
                username,
                name: self.name,
            }),
            _ => None,
        };

        (
            Comment {
                id: self.id,
                content: self.content,
                task_id: self.task_id,
                user_id: self.user_id,
                created_at: self.created_at,
            },
            author,
        )
    }
}

impl Comment {
    /// Whether the given user authored this comment
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Creates a comment on a task
    ///
    /// # Errors
    ///
    /// Returns an error if the task or author does not exist (foreign
    /// key) or the database connection fails. Content emptiness is
    /// validated at the API layer before this is called.
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, task_id, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, task_id, user_id, created_at
            "#,
        )
        .bind(content)
        .bind(task_id)
        .bind(author_id)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    /// Finds a comment by ID
    ///
    /// Returns the comment if found, None otherwise.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, task_id, user_id, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Lists a task's comments with author summaries, newest first
    pub async fn list_by_task_with_authors(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.content, c.task_id, c.user_id, c.created_at,
                   u.email, u.username, u.name
            FROM comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.task_id = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Deletes a comment by ID
    ///
    /// # Returns
    ///
    /// True if the comment was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorship_helper() {
        let author = Uuid::new_v4();
        let comment = Comment {
            id: Uuid::new_v4(),
            content: "Looks good".to_string(),
            task_id: Uuid::new_v4(),
            user_id: author,
            created_at: Utc::now(),
        };

        assert!(comment.is_authored_by(author));
        assert!(!comment.is_authored_by(Uuid::new_v4()));
    }

    #[test]
    fn test_into_parts_with_missing_author() {
        let row = CommentWithAuthor {
            id: Uuid::new_v4(),
            content: "Orphaned".to_string(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            email: None,
            username: None,
            name: None,
        };

        let (comment, author) = row.into_parts();
        assert_eq!(comment.content, "Orphaned");
        assert!(author.is_none());
    }
}
