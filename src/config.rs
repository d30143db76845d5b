//! Process configuration
//!
//! Read once at startup (after `.env` is loaded) and handed to the
//! pipeline, executor, LLM client and transport.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2:1.5b";
const MAX_NUM_PREDICT: u32 = 512;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: Option<String>,
    pub database_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout: Duration,
    pub llm_num_predict: u32,
    pub db_statement_timeout: Duration,
    pub db_max_connections: u32,
    pub strict_sql_gate: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let llm_num_predict = parse_or("LLM_NUM_PREDICT", get("LLM_NUM_PREDICT"), 120u32)?;
        if llm_num_predict == 0 || llm_num_predict > MAX_NUM_PREDICT {
            return Err(ConfigError::Invalid {
                key: "LLM_NUM_PREDICT",
                value: llm_num_predict.to_string(),
            });
        }

        Ok(Self {
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            database_url,
            ollama_url: get("OLLAMA_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 30u64)?),
            llm_num_predict,
            db_statement_timeout: Duration::from_secs(parse_or(
                "DB_STATEMENT_TIMEOUT_SECS",
                get("DB_STATEMENT_TIMEOUT_SECS"),
                10u64,
            )?),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5u32)?,
            strict_sql_gate: parse_bool("SQL_GATE_STRICT", get("SQL_GATE_STRICT"))?,
        })
    }

    /// The bot token, required only by the Telegram transport.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram_bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
        }),
    }
}
