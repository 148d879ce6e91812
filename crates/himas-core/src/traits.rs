use crate::{
    error::HimasError,
    message::{GenerateRequest, Generation, IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Language-model provider.
///
/// The gateway and the home interpreter only ever need one-shot,
/// non-streaming completions, so that is the whole surface.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Run one generation request.
    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, HimasError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive and send messages.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, HimasError>;

    /// Send a response back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), HimasError>;

    /// Send a typing indicator to show the bot is processing.
    async fn send_typing(&self, _target: &str) -> Result<(), HimasError> {
        Ok(())
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), HimasError>;
}
