/// Database models for Taskhub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts
/// - `task`: Tasks owned by a single user
/// - `assignment`: Task-to-user assignments (read access grants)
/// - `comment`: Comments attached to tasks
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::user::{CreateUser, User};
/// use taskhub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     username: "user".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("John Doe".to_string()),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod assignment;
pub mod comment;
pub mod task;
pub mod user;
