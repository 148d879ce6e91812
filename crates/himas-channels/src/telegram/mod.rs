//! Telegram Bot API channel.
//!
//! Long polling via `getUpdates`, replies via `sendMessage`.
//! Docs: <https://core.telegram.org/bots/api>

mod polling;
mod send;
mod types;


use himas_core::config::TelegramConfig;
use std::sync::Arc;
use tokio::sync::Mutex;

const API_BASE: &str = "https://api.telegram.org";

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    base_url: String,
    /// Last `update_id` seen, so updates aren't processed twice.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_api_base(config, API_BASE)
    }

    /// Point the channel at another Bot API server (local server, tests).
    pub fn with_api_base(config: TelegramConfig, api_base: &str) -> Self {
        let base_url = format!(
            "{}/bot{}",
            api_base.trim_end_matches('/'),
            config.bot_token
        );
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }
}

/// Parse a reply target into a Telegram chat id.
fn chat_id(target: &str) -> Result<i64, himas_core::error::HimasError> {
    target.parse().map_err(|e| {
        himas_core::error::HimasError::Channel(format!("invalid telegram chat_id '{target}': {e}"))
    })
}
