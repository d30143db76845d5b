//! Long-polling loop and message routing.

use super::client::{TelegramClient, TelegramError};
use super::types::Update;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const GREETING: &str =
    "Привет! Задайте вопрос на русском. Пример: «Сколько видео набрало больше 100000 просмотров?»";

const POLL_TIMEOUT: Duration = Duration::from_secs(30);
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Greeting,
    Question(&'a str),
    Ignore,
}

/// Decide what to do with an inbound message text.
pub fn route(text: Option<&str>) -> Route<'_> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Route::Ignore;
    };

    if let Some(command) = text.strip_prefix('/') {
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        if matches!(name, "start" | "help") {
            return Route::Greeting;
        }
    }

    Route::Question(text)
}

/// Poll until Ctrl-C. Each question runs in its own task.
pub async fn run_polling(client: TelegramClient, pipeline: Arc<Pipeline>) -> Result<(), TelegramError> {
    let mut offset: Option<i64> = None;
    info!("bot polling started");

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
            updates = client.get_updates(offset, POLL_TIMEOUT) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(err) => {
                warn!(error = %err, "getUpdates failed");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            dispatch(&client, &pipeline, update);
        }
    }
}

fn dispatch(client: &TelegramClient, pipeline: &Arc<Pipeline>, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;

    let reply = match route(message.text.as_deref()) {
        Route::Ignore => {
            debug!(update_id = update.update_id, "ignoring non-text update");
            return;
        }
        Route::Greeting => None,
        Route::Question(question) => Some(question.to_string()),
    };

    let client = client.clone();
    let pipeline = Arc::clone(pipeline);
    tokio::spawn(async move {
        let text = match reply {
            None => GREETING.to_string(),
            Some(question) => pipeline.answer(&question).await.to_string(),
        };
        if let Err(err) = client.send_message(chat_id, &text).await {
            error!(chat_id, error = %err, "sendMessage failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_commands() {
        assert_eq!(route(Some("/start")), Route::Greeting);
        assert_eq!(route(Some("/help")), Route::Greeting);
        assert_eq!(route(Some("/start@video_stats_bot")), Route::Greeting);
        assert_eq!(route(Some("  /help me  ")), Route::Greeting);
    }

    #[test]
    fn test_text_is_a_question() {
        assert_eq!(
            route(Some("  Сколько всего видео? ")),
            Route::Question("Сколько всего видео?")
        );
        assert_eq!(route(Some("/stats")), Route::Question("/stats"));
    }

    #[test]
    fn test_non_text_is_ignored() {
        assert_eq!(route(None), Route::Ignore);
        assert_eq!(route(Some("   ")), Route::Ignore);
    }
}
