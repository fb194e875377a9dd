/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me) and
///   the user directory
/// - `tasks`: Task CRUD and assignment endpoints
/// - `comments`: Comment endpoints

pub mod auth;
pub mod comments;
pub mod health;
pub mod tasks;
