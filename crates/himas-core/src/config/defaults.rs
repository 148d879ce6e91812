//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Himas".to_string()
}

pub fn default_data_dir() -> String {
    "~/.himas".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_wake_word() -> String {
    "robot".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_deny_message() -> String {
    "❌ Denied".to_string()
}

pub fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

pub fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

pub fn default_ollama_timeout() -> u64 {
    30
}

pub fn default_temperature() -> f32 {
    0.1
}

pub fn default_num_predict() -> u32 {
    300
}

pub fn default_ha_base_url() -> String {
    "http://homeassistant.local:8123".to_string()
}

pub fn default_cache_ttl() -> u64 {
    300
}

pub fn default_request_timeout() -> u64 {
    10
}

pub fn default_state_timeout() -> u64 {
    5
}

pub fn default_llm_entity_limit() -> usize {
    80
}

pub fn default_alias_file() -> String {
    "~/.himas/data/ha_mappings.json".to_string()
}
