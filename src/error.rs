use crate::safety::RejectReason;
use std::fmt;
use thiserror::Error;

/// Every way a single question can fail on its way to an integer.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Inference endpoint unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("SQL rejected: {0}")]
    SqlRejected(RejectReason),

    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(String),

    #[error("Result type mismatch: {0}")]
    ResultTypeMismatch(String),
}

/// Copyable tag for a [`PipelineError`], used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UpstreamUnavailable,
    SqlRejected,
    QueryExecutionFailed,
    ResultTypeMismatch,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::UpstreamUnavailable(_) => FailureKind::UpstreamUnavailable,
            PipelineError::SqlRejected(_) => FailureKind::SqlRejected,
            PipelineError::QueryExecutionFailed(_) => FailureKind::QueryExecutionFailed,
            PipelineError::ResultTypeMismatch(_) => FailureKind::ResultTypeMismatch,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UpstreamUnavailable => write!(f, "UpstreamUnavailable"),
            FailureKind::SqlRejected => write!(f, "SQLRejected"),
            FailureKind::QueryExecutionFailed => write!(f, "QueryExecutionFailed"),
            FailureKind::ResultTypeMismatch => write!(f, "ResultTypeMismatch"),
        }
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::QueryExecutionFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        PipelineError::QueryExecutionFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
