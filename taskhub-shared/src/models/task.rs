/// Task model and database operations
///
/// Tasks are the core entity of Taskhub. Every task has exactly one owner,
/// fixed at creation and never transferred; assignments grant other users
/// read access without touching ownership.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'DONE');
/// CREATE TYPE task_priority AS ENUM ('LOW', 'MEDIUM', 'HIGH');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL CHECK (title <> ''),
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'TODO',
///     priority task_priority NOT NULL DEFAULT 'MEDIUM',
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Fix bug".to_string(),
///     description: None,
///     status: TaskStatus::default(),
///     priority: TaskPriority::default(),
///     user_id: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started (default for new tasks)
    #[default]
    Todo,

    /// Work has begun
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// Gets the status as its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    /// Low priority
    Low,

    /// Medium priority (default for new tasks)
    #[default]
    Medium,

    /// High priority
    High,
}

impl TaskPriority {
    /// Gets the priority as its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (never empty)
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Current workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Owning user, fixed at creation; sole holder of write rights
    pub user_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Task title (required, non-empty)
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Initial priority
    pub priority: TaskPriority,

    /// Owner (the authenticated caller)
    pub user_id: Uuid,
}

/// Input for updating an existing task
///
/// All fields are optional. Only non-None fields will be updated; the
/// owner and timestamps are managed by the database.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,
}

/// Filters applied within the caller's visible set when listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive contains match over title and description
    pub search: Option<String>,

    /// Exact status match
    pub status: Option<TaskStatus>,
}

/// Builds a contains-match ILIKE pattern with the term escaped as
/// literal text (backslash first, then the wildcards)
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Task {
    /// Whether the given user is this task's owner
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Creates a new task owned by `data.user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the database
    /// connection fails. Title emptiness is validated at the API layer
    /// before this is called (and enforced again by a CHECK constraint).
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, status, priority, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, status, priority, user_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    ///
    /// Returns the task if found, None otherwise. This is the snapshot
    /// load that precedes every authorization decision; callers must
    /// report a missing task before running any permission check.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, status, priority, user_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks visible to a user, newest first
    ///
    /// The visible set is tasks the user owns plus tasks the user is
    /// assigned to; the query is pre-filtered so no per-row authorization
    /// check is needed. Optional filters apply only within that set:
    ///
    /// - `search`: case-insensitive contains match over title/description
    /// - `status`: exact match
    pub async fn list_visible_to(
        pool: &PgPool,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        // ILIKE pattern; treat the search term as literal text
        let pattern = filter.search.as_deref().map(like_pattern);

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT DISTINCT t.id, t.title, t.description, t.status, t.priority,
                   t.user_id, t.created_at, t.updated_at
            FROM tasks t
            LEFT JOIN task_assignments a ON a.task_id = t.id
            WHERE (t.user_id = $1 OR a.user_id = $1)
              AND ($2::task_status IS NULL OR t.status = $2)
              AND ($3::text IS NULL
                   OR t.title ILIKE $3
                   OR COALESCE(t.description, '') ILIKE $3)
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates an existing task with partial-update semantics
    ///
    /// Only non-None fields in `data` are written; everything else is left
    /// unchanged. The `updated_at` timestamp is always refreshed.
    ///
    /// # Returns
    ///
    /// The updated task if found, None if the task no longer exists (a
    /// concurrent delete surfaces here as None, not as an error).
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 RETURNING id, title, description, status, priority, user_id, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description_opt) = data.description {
            q = q.bind(description_opt);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// Assignments and comments referencing the task are removed by the
    /// database cascade.
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist (e.g. a
    /// concurrent delete won the race).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
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
    fn test_status_defaults_and_strings() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskStatus::Todo.as_str(), "TODO");
        assert_eq!(TaskStatus::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(TaskStatus::Done.as_str(), "DONE");
    }

    #[test]
    fn test_priority_defaults_and_strings() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskPriority::Low.as_str(), "LOW");
        assert_eq!(TaskPriority::High.as_str(), "HIGH");
    }

    #[test]
    fn test_status_serde_wire_format() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");

        let parsed: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    #[test]
    fn test_ownership_helper() {
        let owner = Uuid::new_v4();
        let task = Task {
            id: Uuid::new_v4(),
            title: "Fix bug".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            user_id: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(task.is_owned_by(owner));
        assert!(!task.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("bug"), "%bug%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("foo_bar"), "%foo\\_bar%");
        assert_eq!(like_pattern("C:\\temp"), "%C:\\\\temp%");
    }

    #[test]
    fn test_update_task_default_is_noop() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
    }
}
