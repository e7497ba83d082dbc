//! # Database Persistence Layer
//!
//! Postgres persistence for content keys via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the key vault
//! lives in the `keys` table; when absent the service runs with an
//! in-memory vault and uploaded keys do not survive a restart.
//!
//! The pool is created once at startup, shared by every request through
//! [`crate::state::AppState`], and closed on shutdown.

pub mod keys;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` when `database_url` is `None` (in-memory mode).
/// Returns `Err` if the URL is set but connecting or migrating fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set: running with an in-memory key vault. \
             Keys for uploaded objects will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
