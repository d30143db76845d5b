//! Database module
//!
//! Read-only statement execution against PostgreSQL (or a SQLite fixture)
//! and the table layout used by the loader.

pub mod connection;
pub mod executor;
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use connection::{init_pool, DbPool, PoolSettings};
pub use executor::{coerce_cell, coerce_row, QueryExecutor, ScalarCell};
pub use postgres::PgExecutor;
pub use sqlite::SqliteExecutor;

use crate::config::AppConfig;
use crate::error::Result;
use std::sync::Arc;

/// Pick the executor for `DATABASE_URL`: `sqlite://` paths use SQLite,
/// everything else is treated as a PostgreSQL connection string.
pub async fn connect_executor(config: &AppConfig) -> Result<Arc<dyn QueryExecutor>> {
    if let Some(sqlite) = SqliteExecutor::from_url(&config.database_url, config.db_statement_timeout) {
        return Ok(Arc::new(sqlite));
    }
    Ok(Arc::new(PgExecutor::connect(config).await?))
}
