//! Pipeline Orchestrator
//!
//! question → prompt → model → extracted SQL → safety gate → executor → integer.
//! Any failure collapses into one generic reply; detail stays in the logs.

use crate::config::AppConfig;
use crate::db::{connect_executor, QueryExecutor};
use crate::error::{PipelineError, Result};
use crate::llm::{CompletionProvider, OllamaClient, QueryGenerator};
use crate::safety::{RejectReason, SafetyGate};
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// The only failure text a user ever sees.
pub const FAILURE_MESSAGE: &str = "Не удалось обработать запрос.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Value(i64),
    Failure,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Failure => f.write_str(FAILURE_MESSAGE),
        }
    }
}

pub struct Pipeline {
    generator: QueryGenerator,
    gate: SafetyGate,
    executor: Arc<dyn QueryExecutor>,
}

impl Pipeline {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        executor: Arc<dyn QueryExecutor>,
        gate: SafetyGate,
    ) -> Self {
        Self {
            generator: QueryGenerator::new(provider),
            gate,
            executor,
        }
    }

    /// Wire the Ollama client and the configured store.
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let provider = Arc::new(OllamaClient::from_config(config)?);
        let executor = connect_executor(config).await?;
        let gate = SafetyGate::with_strict(config.strict_sql_gate);
        info!(
            model = %config.ollama_model,
            executor = executor.name(),
            strict_gate = gate.is_strict(),
            "pipeline ready"
        );
        Ok(Self::new(provider, executor, gate))
    }

    /// Run one question and keep the typed failure.
    pub async fn run(&self, question: &str) -> Result<i64> {
        if question.trim().is_empty() {
            return Err(PipelineError::SqlRejected(RejectReason::Empty));
        }

        let sql = self.generator.generate(question).await?;
        info!(question = %question.trim(), sql = %sql, "generated SQL");

        let accepted = self.gate.admit(&sql)?;
        self.executor.fetch_scalar(&accepted).await
    }

    /// Run one question and reduce the outcome to what the user sees.
    pub async fn answer(&self, question: &str) -> Reply {
        let span = info_span!("question", request_id = %Uuid::new_v4());
        async {
            match self.run(question).await {
                Ok(value) => {
                    info!(value, "answered");
                    Reply::Value(value)
                }
                Err(err) => {
                    warn!(kind = %err.kind(), error = %err, question = %question.trim(), "question failed");
                    Reply::Failure
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_rendering() {
        assert_eq!(Reply::Value(42).to_string(), "42");
        assert_eq!(Reply::Value(-3).to_string(), "-3");
        assert_eq!(Reply::Failure.to_string(), FAILURE_MESSAGE);
    }
}
