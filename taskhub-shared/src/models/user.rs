/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing
/// user accounts. A user owns the tasks they create, and may additionally
/// be assigned to tasks owned by other users.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique across all users
    pub email: String,

    /// Username, unique across all users
    pub username: String,

    /// Argon2id password hash
    ///
    /// Never store plaintext passwords!
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional display name
    pub name: Option<String>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address
    pub email: String,

    /// Username
    pub username: String,

    /// Argon2id password hash (NOT the plaintext password!)
    pub password_hash: String,

    /// Optional display name
    pub name: Option<String>,
}

/// Public user view embedded in API responses
///
/// Carries everything the client needs to render a user without
/// exposing the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Username
    pub username: String,

    /// Optional display name
    pub name: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            name: user.name,
        }
    }
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email or username already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, username, password_hash, name, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// Returns the user if found, None otherwise.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Used during login; returns the user if found, None otherwise.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all users as public summaries, ordered by username
    ///
    /// Backs the assignee picker: every authenticated user may see the
    /// user directory.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, email, username, name
            FROM users
            ORDER BY username ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            email: "test@example.com".to_string(),
            username: "test".to_string(),
            password_hash: "hash".to_string(),
            name: Some("Test User".to_string()),
        };

        assert_eq!(create_user.email, "test@example.com");
        assert_eq!(create_user.username, "test");
    }

    #[test]
    fn test_user_summary_drops_credential_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            username: "test".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = UserSummary::from(user.clone());
        assert_eq!(summary.id, user.id);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }
}
