pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod loader;
pub mod observability;
pub mod pipeline;
pub mod prompt;
pub mod safety;
pub mod schema_context;
pub mod telegram;

pub use config::AppConfig;
pub use error::{FailureKind, PipelineError, Result};
pub use pipeline::{Pipeline, Reply, FAILURE_MESSAGE};
pub use safety::{AcceptedSql, GateDecision, RejectReason, SafetyGate};
