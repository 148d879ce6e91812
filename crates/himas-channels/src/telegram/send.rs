//! Message sending, chat actions and command registration.

use super::TelegramChannel;
use crate::utils::split_message;
use himas_core::error::HimasError;
use tracing::{info, warn};

/// Telegram's per-message character limit.
const MAX_MESSAGE_LEN: usize = 4096;

/// Commands shown in the Telegram autocomplete menu.
pub(crate) const BOT_COMMANDS: [(&str, &str); 7] = [
    ("himas", "Control or query Home Assistant"),
    ("explain", "Map a name to an entity id"),
    ("listentities", "List custom entity mappings"),
    ("removeentity", "Remove a custom mapping (admin)"),
    ("find_sensor", "Search Home Assistant entities"),
    ("ha_status", "Home Assistant connection status"),
    ("help", "Show available commands"),
];

impl TelegramChannel {
    /// Send plain text, split into Telegram-sized chunks.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), HimasError> {
        let url = format!("{}/sendMessage", self.base_url);

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| HimasError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(HimasError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Register the command menu. Failures are logged, not returned.
    pub(crate) async fn register_commands(&self) {
        let commands: Vec<_> = BOT_COMMANDS
            .iter()
            .map(|(command, description)| {
                serde_json::json!({ "command": command, "description": description })
            })
            .collect();

        let url = format!("{}/setMyCommands", self.base_url);
        let body = serde_json::json!({ "commands": commands });
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }

    /// Send a chat action (e.g. "typing").
    pub(crate) async fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
    ) -> Result<(), HimasError> {
        let url = format!("{}/sendChatAction", self.base_url);
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| HimasError::Channel(format!("telegram sendChatAction failed: {e}")))?;

        Ok(())
    }
}
