//! SQLite executor
//!
//! Same contract as the PostgreSQL executor over a SQLite file, opened
//! read-only per call. Used for fixtures and offline runs.

use super::executor::{coerce_row, QueryExecutor, ScalarCell};
use crate::error::{PipelineError, Result};
use crate::safety::AcceptedSql;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SQLITE_URL_PREFIX: &str = "sqlite://";

pub struct SqliteExecutor {
    path: PathBuf,
    timeout: Duration,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    /// `sqlite://relative/or/absolute/path.db` → executor, `None` for other schemes.
    pub fn from_url(url: &str, timeout: Duration) -> Option<Self> {
        url.strip_prefix(SQLITE_URL_PREFIX)
            .filter(|path| !path.is_empty())
            .map(|path| Self::new(path, timeout))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn fetch_scalar(&self, sql: &AcceptedSql) -> Result<i64> {
        let path = self.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_read_only(&path))
            .await
            .map_err(task_failed)??;

        let interrupt = conn.get_interrupt_handle();
        let sql = sql.as_str().to_string();
        let task = tokio::task::spawn_blocking(move || first_cell(&conn, &sql));

        let cell = match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined.map_err(task_failed)??,
            Err(_) => {
                // Frees the blocking thread; the statement aborts at its next step.
                interrupt.interrupt();
                return Err(PipelineError::QueryExecutionFailed(format!(
                    "query exceeded {:?}",
                    self.timeout
                )));
            }
        };

        coerce_row(cell)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

fn task_failed(err: tokio::task::JoinError) -> PipelineError {
    PipelineError::QueryExecutionFailed(format!("query task failed: {}", err))
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

fn first_cell(conn: &Connection, sql: &str) -> Result<Option<ScalarCell>> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() == 0 {
        return Err(PipelineError::ResultTypeMismatch("statement returns no columns".to_string()));
    }

    let mut rows = stmt.query([])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let cell = match row.get_ref(0)? {
        ValueRef::Null => ScalarCell::Null,
        ValueRef::Integer(value) => ScalarCell::Int(value),
        ValueRef::Real(value) => ScalarCell::Float(value),
        ValueRef::Text(bytes) => ScalarCell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => ScalarCell::Other("BLOB".to_string()),
    };
    Ok(Some(cell))
}
