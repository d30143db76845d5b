//! Telegram transport
//!
//! Delivers question text to the pipeline and sends back its reply string.

pub mod bot;
pub mod client;
pub mod types;

pub use bot::{route, run_polling, Route, GREETING};
pub use client::{TelegramClient, TelegramError};
