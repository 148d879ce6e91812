mod channels;
mod defaults;
mod home;
mod providers;

#[cfg(test)]
mod tests;

pub use channels::*;
pub use home::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::HimasError;
use defaults::*;

/// Top-level Himas configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub himas: HimasConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HimasConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Group messages starting with this word are answered by the chat model.
    #[serde(default = "default_wake_word")]
    pub wake_word: String,
}

impl Default for HimasConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            wake_word: default_wake_word(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether the whitelist is enforced.
    /// When true and `allowed_users` is empty, only admins get through.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Message sent to unauthorized users.
    #[serde(default = "default_deny_message")]
    pub deny_message: String,
    /// Sender IDs allowed to use home and chat commands.
    #[serde(default)]
    pub allowed_users: Vec<String>,
    /// Sender IDs allowed to run admin-only commands (e.g. `/removeentity`).
    #[serde(default)]
    pub admins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            deny_message: default_deny_message(),
            allowed_users: Vec::new(),
            admins: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn is_admin(&self, sender_id: &str) -> bool {
        self.admins.iter().any(|a| a == sender_id)
    }

    /// Admins are always allowed.
    pub fn is_allowed(&self, sender_id: &str) -> bool {
        !self.enabled || self.is_admin(sender_id) || self.allowed_users.iter().any(|u| u == sender_id)
    }
}

impl Config {
    /// Override endpoints and secrets from the environment.
    ///
    /// Recognized: `HA_URL`, `HA_ACCESS_TOKEN`, `OLLAMA_URL`, `TELEGRAM_BOT_TOKEN`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("HA_URL") {
            self.home_assistant.base_url = url;
        }
        if let Some(token) = get("HA_ACCESS_TOKEN") {
            self.home_assistant.access_token = token;
        }
        if let Some(url) = get("OLLAMA_URL") {
            self.provider.ollama.base_url = url;
        }
        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.channel
                .telegram
                .get_or_insert_with(TelegramConfig::default)
                .bot_token = token;
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Environment
/// overrides are applied in both cases.
pub fn load(path: &str) -> Result<Config, HimasError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HimasError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str::<Config>(&content)
            .map_err(|e| HimasError::Config(format!("failed to parse config: {}", e)))?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    config.apply_env_overrides();
    Ok(config)
}
