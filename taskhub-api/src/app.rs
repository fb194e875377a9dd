/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::auth::{
    jwt,
    middleware::{AuthContext, AuthError},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                 # Health check (public)
/// └── /v1/                                    # API v1 (versioned)
///     ├── /auth/
///     │   ├── POST /register                  # Public
///     │   ├── POST /login                     # Public
///     │   ├── POST /refresh                   # Public
///     │   └── GET  /me                        # Authenticated
///     ├── GET  /users                         # Authenticated
///     ├── /tasks/                             # Authenticated
///     │   ├── GET    /                        # List visible tasks
///     │   ├── POST   /                        # Create task
///     │   ├── GET    /:id                     # Task detail
///     │   ├── PUT    /:id                     # Partial update (owner)
///     │   ├── DELETE /:id                     # Delete (owner)
///     │   ├── POST   /:id/assignments         # Assign user (owner)
///     │   └── DELETE /:id/assignments/:user_id # Unassign user (owner)
///     └── /comments/                          # Authenticated
///         ├── GET    /?task_id=               # List comments
///         ├── POST   /                        # Create comment
///         └── DELETE /:id                     # Delete (author)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything below requires a resolved identity
    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/users", get(routes::auth::list_users))
        .route("/tasks", get(routes::tasks::list_tasks))
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id", delete(routes::tasks::delete_task))
        .route(
            "/tasks/:id/assignments",
            post(routes::tasks::assign_user),
        )
        .route(
            "/tasks/:id/assignments/:user_id",
            delete(routes::tasks::unassign_user),
        )
        .route("/comments", get(routes::comments::list_comments))
        .route("/comments", post(routes::comments::create_comment))
        .route("/comments/:id", delete(routes::comments::delete_comment))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the JWT bearer token from the Authorization
/// header, then injects [`AuthContext`] into request extensions. No
/// operation behind this layer runs without a resolved identity.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    // Parse Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    // Validate token
    let claims = jwt::validate_access_token(token, state.jwt_secret())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    // Insert actor identity into request extensions
    let auth_context = AuthContext::from_jwt(claims.sub);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
