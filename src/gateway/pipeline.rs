//! Message processing pipeline: the handle_message flow.

use super::Gateway;
use crate::commands;
use himas_core::message::{GenerateRequest, IncomingMessage};
use himas_home::error::truncate;
use himas_providers::fallback;
use tracing::{debug, info, warn};

/// What to do with a message that is not a bot command.
#[derive(Debug, PartialEq)]
pub(super) enum Route<'a> {
    /// Send this prompt to the chat model.
    Chat(&'a str),
    /// Group chatter not addressed to the bot.
    Ignore,
}

/// Private chats always reach the model. Group messages only when they
/// start with the wake word, which is stripped from the prompt.
pub(super) fn route<'a>(text: &'a str, is_group: bool, wake_word: &str) -> Route<'a> {
    let text = text.trim();
    if !is_group {
        return Route::Chat(text);
    }
    let wake = wake_word.trim();
    if wake.is_empty() {
        return Route::Ignore;
    }

    let Some(head) = text.get(..wake.len()) else {
        return Route::Ignore;
    };
    if !head.eq_ignore_ascii_case(wake) {
        return Route::Ignore;
    }
    let rest = &text[wake.len()..];
    // "robots" is not "robot".
    if rest.starts_with(|c: char| c.is_alphanumeric()) {
        return Route::Ignore;
    }
    let prompt = rest.trim_start_matches(|c: char| c == ',' || c == ':' || c.is_whitespace());
    if prompt.is_empty() {
        Route::Ignore
    } else {
        Route::Chat(prompt)
    }
}

impl Gateway {
    /// Process a single incoming message through the full pipeline.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let preview = if incoming.text.chars().count() > 60 {
            let truncated: String = incoming.text.chars().take(60).collect();
            format!("{truncated}...")
        } else {
            incoming.text.clone()
        };
        info!(
            "[{}] {} says: {}",
            incoming.channel,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            preview
        );

        // --- 1. AUTH CHECK ---
        if !self.auth_config.is_allowed(&incoming.sender_id) {
            warn!(
                "auth denied for {} on {}",
                incoming.sender_id, incoming.channel
            );
            self.send_text(&incoming, &self.auth_config.deny_message)
                .await;
            return;
        }

        // --- 2. COMMAND DISPATCH ---
        if let Some(cmd) = commands::Command::parse(&incoming.text) {
            if cmd.is_slow() {
                self.send_typing(&incoming).await;
            }
            let ctx = commands::CommandContext {
                home: self.home.as_deref(),
                sender_id: &incoming.sender_id,
                text: &incoming.text,
                is_admin: self.auth_config.is_admin(&incoming.sender_id),
                deny_message: &self.auth_config.deny_message,
            };
            let response = commands::handle(cmd, &ctx).await;
            self.send_text(&incoming, &response).await;
            return;
        }

        // --- 3. CHAT ---
        let prompt = match route(&incoming.text, incoming.is_group, &self.himas_config.wake_word) {
            Route::Chat(prompt) if !prompt.is_empty() => prompt.to_string(),
            _ => {
                debug!("ignoring message from {} (not addressed to the bot)", incoming.sender_id);
                return;
            }
        };

        self.send_typing(&incoming).await;
        let reply = self.chat(&prompt, &incoming.sender_id).await;
        self.send_text(&incoming, &reply).await;
    }

    /// Ask the chat model, walking the fallback chain on failure.
    async fn chat(&self, prompt: &str, sender_id: &str) -> String {
        let models = fallback::chain(
            self.ollama.model_for(sender_id),
            &self.ollama.fallback_models,
        );
        let request = GenerateRequest::new(prompt);

        match fallback::generate_with_fallback(self.provider.as_ref(), &models, &request).await {
            Ok(generation) => {
                info!(
                    "chat answered by {} in {}ms",
                    generation.model.as_deref().unwrap_or("unknown"),
                    generation.processing_time_ms
                );
                generation.text
            }
            Err(e) => {
                warn!("chat failed for {sender_id}: {e}");
                format!("❌ Error: {}", truncate(&e.to_string(), 200))
            }
        }
    }
}
