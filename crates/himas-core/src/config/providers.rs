use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Ollama local provider config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    /// Model used when the sender has no entry in `user_models`.
    #[serde(default = "default_ollama_model")]
    pub model: String,
    /// Generation timeout in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
    /// Models tried (largest first) when the primary model fails in chat.
    #[serde(default)]
    pub fallback_models: Vec<String>,
    /// Per-sender model selection (sender_id → model).
    #[serde(default)]
    pub user_models: HashMap<String, String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            timeout_secs: default_ollama_timeout(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            fallback_models: Vec::new(),
            user_models: HashMap::new(),
        }
    }
}

impl OllamaConfig {
    /// The model configured for `sender_id`, falling back to the default.
    pub fn model_for(&self, sender_id: &str) -> &str {
        self.user_models
            .get(sender_id)
            .map(String::as_str)
            .unwrap_or(&self.model)
    }
}
