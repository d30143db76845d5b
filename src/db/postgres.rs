//! PostgreSQL executor over a sqlx pool.

use super::connection::{init_pool, DbPool, PoolSettings};
use super::executor::{coerce_row, QueryExecutor, ScalarCell};
use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use crate::safety::AcceptedSql;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Row, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::debug;

/// Margin on top of the server-side timeout before the client gives up.
const CLIENT_GRACE: Duration = Duration::from_secs(2);

pub struct PgExecutor {
    pool: DbPool,
    statement_timeout: Duration,
}

impl PgExecutor {
    pub fn new(pool: DbPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Read-only pool with the configured statement timeout.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let settings = PoolSettings {
            max_connections: config.db_max_connections,
            statement_timeout: config.db_statement_timeout,
            read_only: true,
        };
        let pool = init_pool(&config.database_url, &settings).await?;
        Ok(Self::new(pool, config.db_statement_timeout))
    }

    /// One throwaway transaction per statement. It is read-only, carries its
    /// own `statement_timeout` and is always rolled back, which also reverts
    /// any `set_config` the statement made on the pooled session.
    async fn fetch_first_row(&self, sql: &str) -> Result<Option<PgRow>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        // Extended protocol: the server refuses more than one statement.
        let fetched = sqlx::query(sql).fetch_optional(&mut *tx).await;
        tx.rollback().await?;
        Ok(fetched?)
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_scalar(&self, sql: &AcceptedSql) -> Result<i64> {
        // The server-side timeout fires first; this one covers a stalled link.
        let limit = self.statement_timeout + CLIENT_GRACE;
        let row = tokio::time::timeout(limit, self.fetch_first_row(sql.as_str()))
            .await
            .map_err(|_| PipelineError::QueryExecutionFailed(format!("query exceeded {:?}", limit)))??;

        let cell = match row {
            Some(row) => Some(first_cell(&row)?),
            None => None,
        };
        debug!(?cell, "postgres scalar fetched");
        coerce_row(cell)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

fn first_cell(row: &PgRow) -> Result<ScalarCell> {
    if row.columns().is_empty() {
        return Err(PipelineError::ResultTypeMismatch("row has no columns".to_string()));
    }

    let raw = row.try_get_raw(0)?;
    if raw.is_null() {
        return Ok(ScalarCell::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let cell = match type_name.as_str() {
        "INT2" => ScalarCell::Int(row.try_get::<i16, _>(0)?.into()),
        "INT4" => ScalarCell::Int(row.try_get::<i32, _>(0)?.into()),
        "INT8" => ScalarCell::Int(row.try_get::<i64, _>(0)?),
        "NUMERIC" => ScalarCell::Decimal(row.try_get::<Decimal, _>(0)?),
        "FLOAT4" => ScalarCell::Float(row.try_get::<f32, _>(0)?.into()),
        "FLOAT8" => ScalarCell::Float(row.try_get::<f64, _>(0)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => ScalarCell::Text(row.try_get::<String, _>(0)?),
        _ => ScalarCell::Other(type_name),
    };
    Ok(cell)
}
