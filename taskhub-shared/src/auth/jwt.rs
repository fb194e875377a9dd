/// JWT token generation and validation module
///
/// This module provides JWT (JSON Web Token) functionality for user
/// authentication. Tokens are signed using HS256 (HMAC-SHA256) and carry
/// the user's identity as the subject claim.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: 24 hours for access tokens, 30 days for refresh tokens
/// - **Validation**: Signature, expiration, and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, TokenType::Access);
/// let token = create_token(&claims, "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, 24 hours)
    Access,

    /// Refresh token (long-lived, 30 days)
    Refresh,
}

impl TokenType {
    /// Gets default expiration duration for token type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the
/// `token_type` custom claim distinguishing access from refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims with default expiration for the token type
    pub fn new(user_id: Uuid, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, token_type, token_type.default_expiration())
    }

    /// Creates claims with custom expiration
    pub fn with_expiration(user_id: Uuid, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: "taskhub".to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            token_type,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token creation fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired
/// - Issuer is "taskhub"
/// - Token is not used before its nbf time
///
/// # Errors
///
/// Returns an error if the signature is invalid, the token has expired,
/// the issuer doesn't match, or the token format is invalid.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["taskhub"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: "taskhub".to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates token and checks it's an access token
///
/// Convenience wrapper around `validate_token` that also ensures the
/// token type is `Access`; a refresh token must never authenticate a
/// request directly.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::ValidationError(
            "Expected access token, got refresh token".to_string(),
        ));
    }

    Ok(claims)
}

/// Validates token and checks it's a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::ValidationError(
            "Expected refresh token, got access token".to_string(),
        ));
    }

    Ok(claims)
}

/// Refreshes an access token using a refresh token
///
/// Validates the refresh token and issues a new access token for the same
/// subject.
///
/// # Errors
///
/// Returns an error if the refresh token is invalid, expired, or not a
/// refresh token.
pub fn refresh_access_token(refresh_token: &str, secret: &str) -> Result<String, JwtError> {
    let claims = validate_refresh_token(refresh_token, secret)?;

    let access_claims = Claims::new(claims.sub, TokenType::Access);
    create_token(&access_claims, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, TokenType::Access);

        let token = create_token(&claims, SECRET).expect("Token creation should succeed");
        let validated = validate_token(&token, SECRET).expect("Validation should succeed");

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, "taskhub");
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret_fails() {
        let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, SECRET).expect("Token creation should succeed");

        let result = validate_token(&token, "a-completely-different-secret-key");
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Expired well past the default clock-skew leeway
        let claims =
            Claims::with_expiration(Uuid::new_v4(), TokenType::Access, Duration::hours(-1));
        let token = create_token(&claims, SECRET).expect("Token creation should succeed");

        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_access_token_required() {
        let refresh_claims = Claims::new(Uuid::new_v4(), TokenType::Refresh);
        let token = create_token(&refresh_claims, SECRET).expect("Token creation should succeed");

        // A refresh token must not pass access validation
        assert!(validate_access_token(&token, SECRET).is_err());
        assert!(validate_refresh_token(&token, SECRET).is_ok());
    }

    #[test]
    fn test_refresh_flow_issues_access_token() {
        let user_id = Uuid::new_v4();
        let refresh_claims = Claims::new(user_id, TokenType::Refresh);
        let refresh_token =
            create_token(&refresh_claims, SECRET).expect("Token creation should succeed");

        let access_token =
            refresh_access_token(&refresh_token, SECRET).expect("Refresh should succeed");
        let claims =
            validate_access_token(&access_token, SECRET).expect("Validation should succeed");

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_rejects_access_token() {
        let access_claims = Claims::new(Uuid::new_v4(), TokenType::Access);
        let token = create_token(&access_claims, SECRET).expect("Token creation should succeed");

        assert!(refresh_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_is_expired() {
        let live = Claims::new(Uuid::new_v4(), TokenType::Access);
        assert!(!live.is_expired());

        let dead =
            Claims::with_expiration(Uuid::new_v4(), TokenType::Access, Duration::seconds(-1));
        assert!(dead.is_expired());
    }
}
