use thiserror::Error;

/// Top-level error type for Himas.
#[derive(Debug, Error)]
pub enum HimasError {
    /// Error from a language-model provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Error talking to Home Assistant.
    #[error("home assistant error: {0}")]
    HomeAssistant(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
