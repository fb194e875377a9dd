/// Authentication endpoints
///
/// This module provides user authentication endpoints and the user
/// directory used by the assignee picker:
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `GET /v1/auth/me` - Current user (authenticated)
/// - `GET /v1/users` - List users (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User, UserSummary},
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Username
    #[validate(length(min = 3, max = 100, message = "Username must be 3-100 characters"))]
    pub username: String,

    /// Password (will be validated for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for register and login: the user plus a token pair
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The authenticated user
    pub user: UserSummary,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// The authenticated user
    pub user: UserSummary,
}

/// List users response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// All users as public summaries
    pub users: Vec<UserSummary>,
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let access_claims = jwt::Claims::new(user.id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user.id, jwt::TokenType::Refresh);

    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token,
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "username": "user",
///   "password": "password123",
///   "name": "John Doe"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email or username already exists
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    // Validate password strength
    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    // Hash password
    let password_hash = password::hash_password(&req.password)?;

    // Create user (unique violations map to 409 in the error layer)
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            username: req.username,
            password_hash,
            name: req.name,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "user registered");

    let response = issue_tokens(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint
///
/// Authenticates a user and returns JWT tokens. Unknown email and wrong
/// password are indistinguishable in the response.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "password123"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    // Find user by email
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // Verify password
    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::debug!(user_id = %user.id, "user logged in");

    let response = issue_tokens(&state, user)?;
    Ok(Json(response))
}

/// Token refresh endpoint
///
/// Exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Current user endpoint
///
/// Returns the authenticated user's public summary.
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `404 Not Found`: The token's subject no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse { user: user.into() }))
}

/// User directory endpoint
///
/// Lists all users as public summaries. Backs the assignee picker; any
/// authenticated user may call it.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
) -> ApiResult<Json<ListUsersResponse>> {
    let users = User::list_summaries(&state.db).await?;

    Ok(Json(ListUsersResponse { users }))
}
