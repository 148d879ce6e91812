use super::*;
use std::collections::HashMap;

#[test]
fn test_empty_config_uses_defaults() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.himas.name, "Himas");
    assert_eq!(cfg.himas.wake_word, "robot");
    assert!(cfg.auth.enabled);
    assert_eq!(cfg.provider.ollama.base_url, "http://localhost:11434");
    assert_eq!(cfg.provider.ollama.timeout_secs, 30);
    assert_eq!(cfg.provider.ollama.num_predict, 300);
    assert_eq!(cfg.home_assistant.cache_ttl_secs, 300);
    assert_eq!(cfg.home_assistant.state_timeout_secs, 5);
    assert_eq!(cfg.home_assistant.llm_entity_limit, 80);
    assert!(cfg.channel.telegram.is_none());
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [himas]
        name = "House Bot"
        wake_word = "jarvis"

        [auth]
        allowed_users = ["42"]
        admins = ["7"]

        [provider.ollama]
        model = "qwen2.5:7b"
        fallback_models = ["llama3.2:1b"]

        [provider.ollama.user_models]
        "42" = "llama3.2:3b"

        [home_assistant]
        enabled = true
        base_url = "http://ha:8123"
        access_token = "secret"
        allowed_entities = ["light.kitchen"]

        [channel.telegram]
        enabled = true
        bot_token = "123:abc"
        allowed_users = [42]
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.himas.name, "House Bot");
    assert_eq!(cfg.himas.wake_word, "jarvis");
    assert_eq!(cfg.provider.ollama.model_for("42"), "llama3.2:3b");
    assert_eq!(cfg.provider.ollama.model_for("99"), "qwen2.5:7b");
    assert_eq!(cfg.provider.ollama.fallback_models, vec!["llama3.2:1b"]);
    assert!(cfg.home_assistant.enabled);
    assert_eq!(cfg.home_assistant.allowed_entities, vec!["light.kitchen"]);
    // Unset fields keep their defaults.
    assert_eq!(cfg.home_assistant.request_timeout_secs, 10);
    let tg = cfg.channel.telegram.unwrap();
    assert_eq!(tg.allowed_users, vec![42]);
}

#[test]
fn test_auth_allowlist() {
    let auth = AuthConfig {
        allowed_users: vec!["1".into()],
        admins: vec!["2".into()],
        ..Default::default()
    };
    assert!(auth.is_allowed("1"));
    assert!(auth.is_allowed("2"), "admins are implicitly allowed");
    assert!(!auth.is_allowed("3"));
    assert!(auth.is_admin("2"));
    assert!(!auth.is_admin("1"));

    let open = AuthConfig {
        enabled: false,
        ..Default::default()
    };
    assert!(open.is_allowed("anyone"));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("HA_URL", "http://10.0.0.2:8123"),
        ("HA_ACCESS_TOKEN", " tok "),
        ("OLLAMA_URL", ""),
        ("TELEGRAM_BOT_TOKEN", "999:zzz"),
    ]
    .into_iter()
    .collect();

    let mut cfg = Config::default();
    cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(cfg.home_assistant.base_url, "http://10.0.0.2:8123");
    assert_eq!(cfg.home_assistant.access_token, "tok");
    // Empty values are ignored.
    assert_eq!(cfg.provider.ollama.base_url, "http://localhost:11434");
    assert_eq!(cfg.channel.telegram.unwrap().bot_token, "999:zzz");
}

#[test]
fn test_load_missing_file_returns_defaults() {
    let cfg = load("/nonexistent/__himas_config__.toml").unwrap();
    assert_eq!(cfg.himas.data_dir, "~/.himas");
}

#[test]
fn test_load_invalid_toml_is_config_error() {
    let tmp = std::env::temp_dir().join(format!("__himas_bad_config_{}.toml", std::process::id()));
    std::fs::write(&tmp, "[himas\nname = ").unwrap();
    let err = load(tmp.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, HimasError::Config(_)));
    let _ = std::fs::remove_file(&tmp);
}

#[test]
fn test_shellexpand() {
    assert_eq!(shellexpand("/abs/path"), "/abs/path");
    if let Some(home) = std::env::var_os("HOME") {
        assert_eq!(
            shellexpand("~/x.json"),
            format!("{}/x.json", home.to_string_lossy())
        );
    }
}
