/// Comment endpoints
///
/// Any authenticated user may comment on any task and read any task's
/// comment thread. Deletion is reserved for the comment's author; owning
/// the task grants no rights over other people's comments.
///
/// - `GET    /v1/comments?task_id=...` - List a task's comments
/// - `POST   /v1/comments` - Create comment
/// - `DELETE /v1/comments/:id` - Delete comment (author only)

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
use taskhub_shared::{
    auth::{
        authorization::{authorize_comment_delete, authorize_task, TaskAccess, TaskAction},
        middleware::AuthContext,
    },
    models::{comment::Comment, task::Task, user::UserSummary},
};
use uuid::Uuid;
use validator::Validate;

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    /// Comment body (required, non-empty)
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,

    /// Task to attach the comment to
    pub task_id: Uuid,
}

/// Query parameters for listing comments
#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    /// Task whose comments to list (required)
    pub task_id: Option<Uuid>,
}

/// Comment response
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    /// Comment ID
    pub id: Uuid,

    /// Comment body
    pub content: String,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Authoring user ID
    pub user_id: Uuid,

    /// When the comment was created
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Author summary, None if the author no longer resolves
    pub user: Option<UserSummary>,
}

/// List comments response
#[derive(Debug, Serialize)]
pub struct ListCommentsResponse {
    /// The task's comments, newest first
    pub comments: Vec<CommentResponse>,
}

/// List a task's comments
///
/// Open to any authenticated user, including users with no visibility of
/// the task itself.
///
/// # Endpoint
///
/// ```text
/// GET /v1/comments?task_id=<uuid>
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing `task_id` parameter
/// - `404 Not Found`: no task with this id
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Query(query): Query<CommentListQuery>,
) -> ApiResult<Json<ListCommentsResponse>> {
    let task_id = query
        .task_id
        .ok_or_else(|| ApiError::BadRequest("task_id query parameter is required".to_string()))?;

    // The task must exist, but its visibility rules do not apply here
    Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let comments = Comment::list_by_task_with_authors(&state.db, task_id)
        .await?
        .into_iter()
        .map(|row| {
            let (comment, user) = row.into_parts();
            CommentResponse {
                id: comment.id,
                content: comment.content,
                task_id: comment.task_id,
                user_id: comment.user_id,
                created_at: comment.created_at,
                user,
            }
        })
        .collect();

    Ok(Json(ListCommentsResponse { comments }))
}

/// Create a comment on a task
///
/// # Endpoint
///
/// ```text
/// POST /v1/comments
/// Authorization: Bearer <token>
///
/// { "task_id": "...", "content": "Looks good" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: no task with this id
/// - `422 Unprocessable Entity`: empty content
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    // Existence first, then the (always-permitting) comment rule, then
    // input validation; a nonexistent task wins over bad content
    let task = Task::find_by_id(&state.db, req.task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let access = TaskAccess::owner_only(&task);
    authorize_task(auth.user_id, TaskAction::Comment, &access)?;

    req.validate()?;

    let comment = Comment::create(&state.db, task.id, auth.user_id, &req.content).await?;

    tracing::info!(
        comment_id = %comment.id,
        task_id = %task.id,
        user_id = %auth.user_id,
        "comment created"
    );

    let user = taskhub_shared::models::user::User::find_by_id(&state.db, auth.user_id)
        .await?
        .map(UserSummary::from);

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            id: comment.id,
            content: comment.content,
            task_id: comment.task_id,
            user_id: comment.user_id,
            created_at: comment.created_at,
            user,
        }),
    ))
}

/// Delete a comment (author only)
///
/// # Errors
///
/// - `404 Not Found`: no comment with this id
/// - `403 Forbidden`: caller did not write the comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = Comment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    authorize_comment_delete(auth.user_id, comment.user_id)?;

    let deleted = Comment::delete(&state.db, comment.id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    tracing::info!(
        comment_id = %comment.id,
        user_id = %auth.user_id,
        "comment deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
