//! Database connection management using sqlx

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub type DbPool = PgPool;

/// Pool settings derived from [`crate::config::AppConfig`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub statement_timeout: Duration,
    /// Sessions refuse writes unless the caller is the loader.
    pub read_only: bool,
}

/// Initialize the database connection pool
pub async fn init_pool(database_url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let mut session = vec![(
        "statement_timeout",
        format!("{}ms", settings.statement_timeout.as_millis()),
    )];
    if settings.read_only {
        session.push(("default_transaction_read_only", "on".to_string()));
    }

    let options = PgConnectOptions::from_str(database_url)?.options(session);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await?;

    Ok(pool)
}
