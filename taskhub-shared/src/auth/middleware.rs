/// Authentication context for Axum handlers
///
/// This module provides the authentication context that the API's JWT
/// middleware attaches to each request, plus the error type for failed
/// credential extraction. Every protected operation runs only after a
/// bearer credential has been resolved to a user identity; a failure here
/// is terminal for the request.
///
/// # Request Extensions
///
/// After successful authentication the middleware adds an [`AuthContext`]
/// to the request extensions. Handlers extract it with Axum's `Extension`
/// extractor:
///
/// ```
/// use axum::Extension;
/// use taskhub_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Authentication context added to request extensions
///
/// The actor identity for every authorization decision downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("Invalid authorization header: {0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthError::InvalidFormat(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        };

        let body = Json(json!({
            "error": error_code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_jwt() {
        let user_id = Uuid::new_v4();
        let ctx = AuthContext::from_jwt(user_id);
        assert_eq!(ctx.user_id, user_id);
    }

    #[test]
    fn test_auth_error_status_codes() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("no bearer".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AuthError::InvalidToken("expired".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
