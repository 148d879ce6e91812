//! Long-polling update loop and Channel trait implementation.

use super::types::{TgResponse, TgUpdate};
use super::{chat_id, TelegramChannel};
use async_trait::async_trait;
use himas_core::{
    error::HimasError,
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const MAX_BACKOFF_SECS: u64 = 60;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, HimasError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_users = self.config.allowed_users.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let offset = last_update_id.lock().await.map(|id| id + 1);
                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let body = match poll_once(&client, &url).await {
                    Ok(b) if b.ok => b,
                    Ok(b) => {
                        let reason = b.description.unwrap_or_default();
                        error!("telegram API error (retry in {backoff_secs}s): {reason}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        continue;
                    }
                    Err(e) => {
                        error!("telegram {e} (retry in {backoff_secs}s)");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                        continue;
                    }
                };

                backoff_secs = 1;
                let updates = body.result.unwrap_or_default();

                if let Some(last) = updates.last() {
                    *last_update_id.lock().await = Some(last.update_id);
                }

                for update in updates {
                    let Some(incoming) = to_incoming(update, &allowed_users) else {
                        continue;
                    };
                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), HimasError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| HimasError::Channel("no reply_target on outgoing message".into()))?;
        self.send_text(chat_id(target)?, &message.text).await
    }

    async fn send_typing(&self, target: &str) -> Result<(), HimasError> {
        self.send_chat_action(chat_id(target)?, "typing").await
    }

    async fn stop(&self) -> Result<(), HimasError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

async fn poll_once(
    client: &reqwest::Client,
    url: &str,
) -> Result<TgResponse<Vec<TgUpdate>>, String> {
    let resp = client
        .get(url)
        .timeout(Duration::from_secs(35))
        .send()
        .await
        .map_err(|e| format!("poll error: {e}"))?;
    resp.json().await.map_err(|e| format!("parse error: {e}"))
}

/// Convert an update into a gateway message.
///
/// Skips non-text updates, anonymous senders and users outside
/// `allowed_users` (empty = everyone). Group messages are kept and flagged;
/// the gateway decides what to answer.
pub(super) fn to_incoming(update: TgUpdate, allowed_users: &[i64]) -> Option<IncomingMessage> {
    let msg = update.message?;
    let text = msg.text?;
    let user = msg.from?;

    if !allowed_users.is_empty() && !allowed_users.contains(&user.id) {
        warn!("ignoring message from unauthorized user {}", user.id);
        return None;
    }

    let is_group = msg.chat.is_group();
    if is_group {
        debug!("telegram: group message in chat {}", msg.chat.id);
    }

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(user.display_name()),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(msg.chat.id.to_string()),
        is_group,
    })
}
