use super::types::{ApiResponse, GetUpdatesRequest, SendMessageRequest, Update};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Thin Bot API client: long-poll for updates, send plain text replies.
#[derive(Clone)]
pub struct TelegramClient {
    base_url: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        Self::with_api_url(TELEGRAM_API_URL, token)
    }

    pub fn with_api_url(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            http,
        })
    }

    /// Long-poll for new messages starting at `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, poll_timeout: Duration) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: vec!["message"],
        };
        // The request must outlive the server-side poll.
        self.call("getUpdates", &body, poll_timeout + Duration::from_secs(10)).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let body = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &body, Duration::from_secs(15)).await?;
        Ok(())
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response.description.unwrap_or_else(|| format!("{} failed", method)),
            ));
        }
        response
            .result
            .ok_or_else(|| TelegramError::Api(format!("{} returned no result", method)))
    }
}
