//! Gateway: the main event loop connecting channels, the home interpreter
//! and the chat model.
//!
//! Includes auth enforcement, per-sender serialization and graceful shutdown.

mod pipeline;

#[cfg(test)]
mod tests;

use himas_core::{
    config::{AuthConfig, HimasConfig, OllamaConfig},
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, Provider},
};
use himas_home::HomeInterpreter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// The central gateway that routes messages between channels and handlers.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    /// `None` when Home Assistant is disabled.
    pub(super) home: Option<Arc<HomeInterpreter>>,
    pub(super) auth_config: AuthConfig,
    pub(super) himas_config: HimasConfig,
    pub(super) ollama: OllamaConfig,
    /// Senders with a message in flight. New messages from them are buffered here.
    pub(super) active_senders: Mutex<HashMap<String, Vec<IncomingMessage>>>,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        home: Option<Arc<HomeInterpreter>>,
        auth_config: AuthConfig,
        himas_config: HimasConfig,
        ollama: OllamaConfig,
    ) -> Self {
        Self {
            provider,
            channels,
            home,
            auth_config,
            himas_config,
            ollama,
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop until ctrl-c.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "{} gateway running | provider: {} | channels: {} | home: {} | auth: {}",
            self.himas_config.name,
            self.provider.name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            if self.home.is_some() { "enabled" } else { "disabled" },
            if self.auth_config.enabled {
                "enforced"
            } else {
                "disabled"
            },
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(incoming) = maybe else {
                        warn!("all channels closed");
                        break;
                    };
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.dispatch_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch a message: buffer if the sender is busy, otherwise process.
    ///
    /// Messages from one sender are handled in arrival order; different
    /// senders run concurrently.
    pub(super) async fn dispatch_message(self: Arc<Self>, incoming: IncomingMessage) {
        let sender_key = format!("{}:{}", incoming.channel, incoming.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                buffer.push(incoming);
                info!("buffered message from {sender_key} (previous one still running)");
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_message(incoming).await;

        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(&sender_key) {
                    Some(buf) if !buf.is_empty() => Some(buf.remove(0)),
                    _ => {
                        active.remove(&sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered message from {sender_key}");
                    self.handle_message(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Graceful shutdown: stop every channel.
    async fn shutdown(&self) {
        info!("Shutting down...");

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a plain text message back to the sender.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: incoming.reply_target.clone(),
        };

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message: {e}");
            }
        }
    }

    /// Best-effort typing indicator.
    pub(super) async fn send_typing(&self, incoming: &IncomingMessage) {
        let (Some(channel), Some(target)) = (
            self.channels.get(&incoming.channel),
            incoming.reply_target.as_deref(),
        ) else {
            return;
        };
        if let Err(e) = channel.send_typing(target).await {
            warn!("typing indicator failed: {e}");
        }
    }
}
