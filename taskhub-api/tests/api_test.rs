/// Integration tests for the API surface
///
/// These tests run the real router with a lazy database pool, covering
/// everything that must be decided before any repository call:
/// - The authentication gate in front of protected routes
/// - Token type and expiry enforcement
/// - Request validation that rejects writes before they reach the pool

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use taskhub_shared::auth::jwt::TokenType;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Every protected route rejects requests without credentials
#[tokio::test]
async fn test_protected_routes_require_auth() {
    let ctx = TestContext::new();

    for (method, uri) in [
        ("GET", "/v1/auth/me"),
        ("GET", "/v1/users"),
        ("GET", "/v1/tasks"),
        ("POST", "/v1/tasks"),
        ("GET", "/v1/comments?task_id=00000000-0000-0000-0000-000000000000"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = ctx.app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} must require auth",
            method,
            uri
        );
    }
}

/// A header without the Bearer scheme is a malformed request
#[tokio::test]
async fn test_non_bearer_header_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Garbage tokens are rejected
#[tokio::test]
async fn test_invalid_token_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A refresh token must not authenticate a request directly
#[tokio::test]
async fn test_refresh_token_rejected_as_access() {
    let ctx = TestContext::new();
    let refresh_token = ctx.token(TokenType::Refresh);

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", format!("Bearer {}", refresh_token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Expired tokens are rejected
#[tokio::test]
async fn test_expired_token_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", ctx.expired_auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// An empty title is rejected before the task repository is touched
#[tokio::test]
async fn test_create_task_empty_title_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "" }).to_string()))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "title");
}

/// An overlong title is rejected the same way
#[tokio::test]
async fn test_create_task_overlong_title_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "x".repeat(256) }).to_string()))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Registration enforces password strength before touching the database
#[tokio::test]
async fn test_register_weak_password_rejected() {
    let ctx = TestContext::new();

    // Long enough, but all digits
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": "jane@example.com",
                "username": "janedoe",
                "password": "12345678"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["details"][0]["field"], "password");
}

/// Registration rejects malformed email addresses
#[tokio::test]
async fn test_register_invalid_email_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": "not-an-email",
                "username": "janedoe",
                "password": "password123"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// Login validates the email shape before any lookup
#[tokio::test]
async fn test_login_invalid_email_rejected() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": "nope", "password": "password123" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

/// The refresh endpoint rejects tokens that aren't refresh tokens
#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let ctx = TestContext::new();
    let access_token = ctx.token(TokenType::Access);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/refresh")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "refresh_token": access_token }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// The refresh endpoint issues a usable access token
#[tokio::test]
async fn test_refresh_issues_access_token() {
    let ctx = TestContext::new();
    let refresh_token = ctx.token(TokenType::Refresh);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/refresh")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "refresh_token": refresh_token }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let token = body["access_token"].as_str().unwrap();

    let claims =
        taskhub_shared::auth::jwt::validate_access_token(token, common::TEST_SECRET).unwrap();
    assert_eq!(claims.sub, ctx.user_id);
}

/// Task existence is checked before content validation: with the
/// database unreachable, an empty comment body on an unknown task dies
/// at the task lookup rather than returning a validation error
#[tokio::test]
async fn test_create_comment_checks_task_before_validation() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/comments")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "content": "",
                "task_id": "00000000-0000-0000-0000-000000000000"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_ne!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Comment listing is deliberately open to any authenticated user: the
/// request passes the gate with no task-visibility decision and goes
/// straight to the repository, which is where it fails here (the lazy
/// pool never connects), not with a 403
#[tokio::test]
async fn test_list_comments_not_gated_by_task_visibility() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/comments?task_id=00000000-0000-0000-0000-000000000000")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_ne!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Listing comments without a task_id is a bad request
#[tokio::test]
async fn test_list_comments_requires_task_id() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/comments")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Unknown routes fall through to 404
#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/nope")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
