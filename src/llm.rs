use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use crate::prompt::build_prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Stop sequences that keep the model from starting another worked example.
pub const STOP_SEQUENCES: &[&str] = &["\n\n", "Вопрос:", "Пример:"];

/// Anything that turns a prompt into a raw completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
    pub stop: Vec<String>,
}

impl GenerateOptions {
    /// Greedy decoding with a bounded output budget.
    pub fn greedy(num_predict: u32) -> Self {
        Self {
            temperature: 0.0,
            num_predict,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: &'a GenerateOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

/// Client for a local Ollama `/api/generate` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    options: GenerateOptions,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration, num_predict: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::UpstreamUnavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options: GenerateOptions::greedy(num_predict),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.ollama_url,
            &config.ollama_model,
            config.llm_timeout,
            config.llm_num_predict,
        )
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(format!("Ollama call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::UpstreamUnavailable(format!(
                "Ollama returned {}: {}",
                status, text
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(format!("Failed to parse Ollama response: {}", e)))?;

        debug!(chars = parsed.response.len(), "completion received");
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Pull one candidate statement out of a free-form completion.
///
/// The first line starting with `select` (case-insensitive, fencing
/// stripped) wins. Otherwise the first non-empty line is returned as a
/// best effort, or an empty string for an empty completion.
pub fn extract_sql(completion: &str) -> String {
    let lines = || completion.lines().map(strip_fencing);

    if let Some(select) = lines().find(|line| line.to_lowercase().starts_with("select")) {
        return select.to_string();
    }

    lines()
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

fn strip_fencing(line: &str) -> &str {
    line.trim().trim_matches('`').trim()
}

/// Prompt in, candidate SQL out.
pub struct QueryGenerator {
    provider: std::sync::Arc<dyn CompletionProvider>,
}

impl QueryGenerator {
    pub fn new(provider: std::sync::Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn generate(&self, question: &str) -> Result<String> {
        let prompt = build_prompt(question);
        let completion = self.provider.complete(&prompt).await?;
        Ok(extract_sql(&completion))
    }
}
