use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Home Assistant integration config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ha_base_url")]
    pub base_url: String,
    /// Long-lived access token sent as a bearer token.
    #[serde(default)]
    pub access_token: String,
    /// How long the entity list stays fresh, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Timeout for the entity list fetch and service calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for single-entity state reads.
    #[serde(default = "default_state_timeout")]
    pub state_timeout_secs: u64,
    /// Max `friendly_name -> entity_id` pairs embedded in the LLM prompt.
    #[serde(default = "default_llm_entity_limit")]
    pub llm_entity_limit: usize,
    /// JSON file holding `/explain` mappings.
    #[serde(default = "default_alias_file")]
    pub alias_file: String,
    /// Entity ids the bot may see. Empty = all entities the token can see.
    #[serde(default)]
    pub allowed_entities: Vec<String>,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_ha_base_url(),
            access_token: String::new(),
            cache_ttl_secs: default_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
            state_timeout_secs: default_state_timeout(),
            llm_entity_limit: default_llm_entity_limit(),
            alias_file: default_alias_file(),
            allowed_entities: Vec::new(),
        }
    }
}
