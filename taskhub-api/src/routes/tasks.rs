/// Task endpoints
///
/// Task CRUD plus assignment management. Every handler behind the auth
/// layer follows the same order: load the target, report "not found" if
/// the id doesn't resolve, ask the authorization policy, validate input,
/// then mutate. Existence is always checked before permission so probing
/// an id leaks nothing.
///
/// - `GET    /v1/tasks` - List tasks visible to the caller
/// - `POST   /v1/tasks` - Create task
/// - `GET    /v1/tasks/:id` - Task detail with assignments and comments
/// - `PUT    /v1/tasks/:id` - Partial update (owner only)
/// - `DELETE /v1/tasks/:id` - Delete (owner only)
/// - `POST   /v1/tasks/:id/assignments` - Assign user (owner only)
/// - `DELETE /v1/tasks/:id/assignments/:user_id` - Unassign (owner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use taskhub_shared::{
    auth::{
        authorization::{authorize_task, TaskAccess, TaskAction},
        middleware::AuthContext,
    },
    models::{
        assignment::TaskAssignment,
        comment::Comment,
        task::{CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask},
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title (required, non-empty)
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to TODO)
    pub status: Option<TaskStatus>,

    /// Initial priority (defaults to MEDIUM)
    pub priority: Option<TaskPriority>,
}

/// Update task request
///
/// All fields optional; absent fields are left unchanged. Sending
/// `"description": null` clears the description.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,
}

/// Distinguishes an absent field (None) from an explicit null
/// (Some(None)) so a PUT can clear the description
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Query parameters for listing tasks
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Case-insensitive contains match over title and description
    pub search: Option<String>,

    /// Exact status match
    pub status: Option<TaskStatus>,
}

/// Assign user request
#[derive(Debug, Deserialize)]
pub struct AssignUserRequest {
    /// User to grant read access to
    pub user_id: Uuid,
}

/// Assignment view embedded in task responses
#[derive(Debug, Serialize)]
pub struct AssignmentView {
    /// Assignment ID
    pub id: Uuid,

    /// Assignee user ID
    pub user_id: Uuid,

    /// When the assignment was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Assignee public summary
    pub user: UserSummary,
}

/// Comment view embedded in the task detail response
#[derive(Debug, Serialize)]
pub struct CommentView {
    /// Comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Authoring user ID
    pub user_id: Uuid,

    /// When the comment was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Author summary, None if the author no longer resolves
    pub user: Option<UserSummary>,
}

/// Task response shape shared by list, create, and update
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Task title
    pub title: String,

    /// Task description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Owning user ID
    pub user_id: Uuid,

    /// When the task was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// When the task was last updated
    pub updated_at: chrono::DateTime<chrono::Utc>,

    /// Owner public summary
    pub user: UserSummary,

    /// Current assignments with assignee summaries
    pub assignments: Vec<AssignmentView>,
}

/// Task detail response: the task plus its comment thread
#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    /// The task with its assignments
    #[serde(flatten)]
    pub task: TaskResponse,

    /// Comments on the task, newest first
    pub comments: Vec<CommentView>,
}

/// List tasks response
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Visible tasks, newest first
    pub tasks: Vec<TaskResponse>,
}

async fn task_view(pool: &PgPool, task: Task) -> ApiResult<TaskResponse> {
    // The owner FK cascades, so a loaded task always resolves its owner
    let owner = User::find_by_id(pool, task.user_id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Task owner does not resolve".to_string()))?;

    let assignments = TaskAssignment::list_with_users(pool, task.id)
        .await?
        .into_iter()
        .map(|row| {
            let (assignment, user) = row.into_parts();
            AssignmentView {
                id: assignment.id,
                user_id: assignment.user_id,
                created_at: assignment.created_at,
                user,
            }
        })
        .collect();

    Ok(TaskResponse {
        id: task.id,
        title: task.title,
        description: task.description,
        status: task.status,
        priority: task.priority,
        user_id: task.user_id,
        created_at: task.created_at,
        updated_at: task.updated_at,
        user: owner.into(),
        assignments,
    })
}

fn comment_view(row: taskhub_shared::models::comment::CommentWithAuthor) -> CommentView {
    let (comment, user) = row.into_parts();
    CommentView {
        id: comment.id,
        content: comment.content,
        user_id: comment.user_id,
        created_at: comment.created_at,
        user,
    }
}

/// Loads a task or reports 404
async fn load_task(pool: &PgPool, id: Uuid) -> ApiResult<Task> {
    Task::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// List tasks visible to the caller
///
/// The visible set is tasks the caller owns plus tasks the caller is
/// assigned to. Filters apply within that set only.
///
/// # Endpoint
///
/// ```text
/// GET /v1/tasks?search=bug&status=TODO
/// Authorization: Bearer <token>
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let filter = TaskFilter {
        search: query.search,
        status: query.status,
    };

    let tasks = Task::list_visible_to(&state.db, auth.user_id, &filter).await?;

    let mut views = Vec::with_capacity(tasks.len());
    for task in tasks {
        views.push(task_view(&state.db, task).await?);
    }

    Ok(Json(ListTasksResponse { tasks: views }))
}

/// Create a new task owned by the caller
///
/// Status defaults to TODO and priority to MEDIUM when omitted.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty or overlong title
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            user_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "task created");

    let view = task_view(&state.db, task).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Task detail with assignments and comments
///
/// # Errors
///
/// - `404 Not Found`: no task with this id
/// - `403 Forbidden`: caller is neither owner nor assignee
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskDetailResponse>> {
    let task = load_task(&state.db, id).await?;

    let assignee_ids = TaskAssignment::assignee_ids(&state.db, task.id).await?;
    let access = TaskAccess::from_task(&task, assignee_ids);
    authorize_task(auth.user_id, TaskAction::Read, &access)?;

    let comments = Comment::list_by_task_with_authors(&state.db, task.id)
        .await?
        .into_iter()
        .map(comment_view)
        .collect();

    let task = task_view(&state.db, task).await?;

    Ok(Json(TaskDetailResponse { task, comments }))
}

/// Partial update of a task (owner only)
///
/// Absent fields are left unchanged; an explicit `"description": null`
/// clears the description.
///
/// # Errors
///
/// - `404 Not Found`: no task with this id
/// - `403 Forbidden`: caller is not the owner
/// - `422 Unprocessable Entity`: empty or overlong title
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let task = load_task(&state.db, id).await?;

    let access = TaskAccess::owner_only(&task);
    authorize_task(auth.user_id, TaskAction::Update, &access)?;

    req.validate()?;

    let updated = Task::update(
        &state.db,
        task.id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
        },
    )
    .await?
    // Deleted between snapshot and write
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %updated.id, user_id = %auth.user_id, "task updated");

    let view = task_view(&state.db, updated).await?;
    Ok(Json(view))
}

/// Delete a task (owner only)
///
/// Assignments and comments on the task are removed with it.
///
/// # Errors
///
/// - `404 Not Found`: no task with this id
/// - `403 Forbidden`: caller is not the owner
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = load_task(&state.db, id).await?;

    let access = TaskAccess::owner_only(&task);
    authorize_task(auth.user_id, TaskAction::Delete, &access)?;

    let deleted = Task::delete(&state.db, task.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Assign a user to a task (owner only)
///
/// Grants the target user read access to the task.
///
/// # Endpoint
///
/// ```text
/// POST /v1/tasks/:id/assignments
/// Authorization: Bearer <token>
///
/// { "user_id": "..." }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: task or target user does not exist
/// - `403 Forbidden`: caller is not the owner
/// - `409 Conflict`: user is already assigned to the task
pub async fn assign_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignUserRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentView>)> {
    let task = load_task(&state.db, id).await?;

    let access = TaskAccess::owner_only(&task);
    authorize_task(auth.user_id, TaskAction::Assign, &access)?;

    // The target must resolve to an actual user
    let target = User::find_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let assignment = TaskAssignment::create(&state.db, task.id, target.id).await?;

    tracing::info!(
        task_id = %task.id,
        assignee = %target.id,
        user_id = %auth.user_id,
        "user assigned to task"
    );

    let view = AssignmentView {
        id: assignment.id,
        user_id: assignment.user_id,
        created_at: assignment.created_at,
        user: target.into(),
    };

    Ok((StatusCode::CREATED, Json(view)))
}

/// Remove a user's assignment from a task (owner only)
///
/// Idempotent: removing an assignment that doesn't exist still returns
/// 204.
///
/// # Errors
///
/// - `404 Not Found`: no task with this id
/// - `403 Forbidden`: caller is not the owner
pub async fn unassign_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let task = load_task(&state.db, id).await?;

    let access = TaskAccess::owner_only(&task);
    authorize_task(auth.user_id, TaskAction::Unassign, &access)?;

    let removed = TaskAssignment::delete_by_task_and_user(&state.db, task.id, user_id).await?;

    tracing::info!(
        task_id = %task.id,
        assignee = %user_id,
        removed,
        user_id = %auth.user_id,
        "user unassigned from task"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_task_response_embeds_owner_summary() {
        let owner_id = Uuid::new_v4();
        let response = TaskResponse {
            id: Uuid::new_v4(),
            title: "Fix bug".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            user_id: owner_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user: UserSummary {
                id: owner_id,
                email: "jane@example.com".to_string(),
                username: "janedoe".to_string(),
                name: Some("Jane Doe".to_string()),
            },
            assignments: Vec::new(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["id"], json["user_id"]);
        assert_eq!(json["user"]["username"], "janedoe");
        assert!(json["user"].get("password_hash").is_none());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{ "title": "New" }"#).unwrap();
        assert!(absent.description.is_none());

        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{ "description": null }"#).unwrap();
        assert_eq!(cleared.description, Some(None));
    }
}
