//! # Taskhub API Server
//!
//! REST API for the Taskhub task tracker:
//! - JWT authentication (register, login, refresh)
//! - Task CRUD with owner/assignee access control
//! - Task assignments and comments
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhub-api
//! ```

use taskhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskhub_shared::db::{migrations::run_migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskhub_api=debug,taskhub_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskhub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize database pool
    let db_config = pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    };
    let db = pool::create_pool(db_config).await?;
    tracing::info!("Database pool established");

    // Apply pending migrations
    run_migrations(&db).await?;

    // Build the application
    let bind_address = config.bind_address();
    let state = AppState::new(db, config);
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
