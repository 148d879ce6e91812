use super::pipeline::{route, Route};
use super::*;
use async_trait::async_trait;
use himas_core::{
    error::HimasError,
    message::{GenerateRequest, Generation},
};
use std::sync::Mutex as StdMutex;

/// Channel that records what the gateway sends.
#[derive(Default)]
struct RecordingChannel {
    sent: StdMutex<Vec<OutgoingMessage>>,
    typing: StdMutex<Vec<String>>,
}

impl RecordingChannel {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "test"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, HimasError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), HimasError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn send_typing(&self, target: &str) -> Result<(), HimasError> {
        self.typing.lock().unwrap().push(target.to_string());
        Ok(())
    }

    async fn stop(&self) -> Result<(), HimasError> {
        Ok(())
    }
}

/// Provider that fails for listed models and echoes otherwise.
struct EchoProvider {
    down: Vec<&'static str>,
    seen: StdMutex<Vec<String>>,
}

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Generation, HimasError> {
        let model = request.model.clone().unwrap_or_default();
        self.seen.lock().unwrap().push(model.clone());
        if self.down.contains(&model.as_str()) {
            return Err(HimasError::Provider(format!("{model} unavailable")));
        }
        Ok(Generation {
            text: format!("{model}: {}", request.prompt),
            model: Some(model),
            processing_time_ms: 1,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }
}

fn gateway(
    down: Vec<&'static str>,
    auth: AuthConfig,
) -> (Arc<Gateway>, Arc<RecordingChannel>, Arc<EchoProvider>) {
    let channel = Arc::new(RecordingChannel::default());
    let provider = Arc::new(EchoProvider {
        down,
        seen: StdMutex::new(Vec::new()),
    });
    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert("test".to_string(), channel.clone());

    let ollama = OllamaConfig {
        model: "small:3b".into(),
        fallback_models: vec!["tiny:1b".into(), "big:14b".into()],
        ..Default::default()
    };
    let gw = Gateway::new(
        provider.clone(),
        channels,
        None,
        auth,
        HimasConfig::default(),
        ollama,
    );
    (Arc::new(gw), channel, provider)
}

fn open_auth() -> AuthConfig {
    AuthConfig {
        enabled: false,
        ..Default::default()
    }
}

fn message(sender: &str, text: &str, is_group: bool) -> IncomingMessage {
    IncomingMessage {
        id: uuid::Uuid::new_v4(),
        channel: "test".into(),
        sender_id: sender.into(),
        sender_name: Some("Robin".into()),
        text: text.into(),
        timestamp: chrono::Utc::now(),
        reply_target: Some("chat-1".into()),
        is_group,
    }
}

// --- routing ---

#[test]
fn test_private_messages_go_to_chat() {
    assert_eq!(route("  hello  ", false, "robot"), Route::Chat("hello"));
}

#[test]
fn test_group_messages_need_wake_word() {
    assert_eq!(route("hello all", true, "robot"), Route::Ignore);
    assert_eq!(
        route("Robot, what is rust?", true, "robot"),
        Route::Chat("what is rust?")
    );
    assert_eq!(route("robot: hi", true, "robot"), Route::Chat("hi"));
    assert_eq!(route("robots are cool", true, "robot"), Route::Ignore);
    assert_eq!(route("robot", true, "robot"), Route::Ignore);
    assert_eq!(route("rob", true, "robot"), Route::Ignore);
}

#[test]
fn test_empty_wake_word_ignores_groups() {
    assert_eq!(route("robot hi", true, ""), Route::Ignore);
}

#[test]
fn test_wake_word_with_multibyte_text() {
    assert_eq!(route("ró", true, "robot"), Route::Ignore);
    assert_eq!(route("robotñ", true, "robot"), Route::Ignore);
}

// --- pipeline ---

#[tokio::test]
async fn test_unauthorized_sender_gets_deny_message() {
    let auth = AuthConfig {
        enabled: true,
        allowed_users: vec!["1".into()],
        ..Default::default()
    };
    let (gw, channel, provider) = gateway(vec![], auth);
    gw.handle_message(message("99", "hello", false)).await;

    assert_eq!(channel.texts(), vec!["❌ Denied"]);
    assert!(provider.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_passes_auth() {
    let auth = AuthConfig {
        enabled: true,
        admins: vec!["7".into()],
        ..Default::default()
    };
    let (gw, channel, _) = gateway(vec![], auth);
    gw.handle_message(message("7", "hello", false)).await;
    assert_eq!(channel.texts(), vec!["small:3b: hello"]);
}

#[tokio::test]
async fn test_commands_bypass_chat() {
    let (gw, channel, provider) = gateway(vec![], open_auth());
    gw.handle_message(message("1", "/help", false)).await;
    gw.handle_message(message("1", "/himas lamp on", false)).await;

    let texts = channel.texts();
    assert!(texts[0].contains("/himas"));
    assert_eq!(texts[1], "🏠 Home Assistant is not configured.");
    assert!(provider.seen.lock().unwrap().is_empty());
    assert_eq!(*channel.typing.lock().unwrap(), vec!["chat-1"]);
}

#[tokio::test]
async fn test_group_chatter_is_ignored() {
    let (gw, channel, provider) = gateway(vec![], open_auth());
    gw.handle_message(message("1", "lunch anyone?", true)).await;
    assert!(channel.texts().is_empty());
    assert!(provider.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_wake_word_reaches_chat() {
    let (gw, channel, _) = gateway(vec![], open_auth());
    gw.handle_message(message("1", "robot tell me a joke", true)).await;
    assert_eq!(channel.texts(), vec!["small:3b: tell me a joke"]);
}

#[tokio::test]
async fn test_chat_falls_back_largest_first() {
    let (gw, channel, provider) = gateway(vec!["small:3b", "big:14b"], open_auth());
    gw.handle_message(message("1", "hi", false)).await;

    assert_eq!(channel.texts(), vec!["tiny:1b: hi"]);
    assert_eq!(
        *provider.seen.lock().unwrap(),
        vec!["small:3b", "big:14b", "tiny:1b"]
    );
}

#[tokio::test]
async fn test_chat_all_models_down() {
    let (gw, channel, _) = gateway(vec!["small:3b", "big:14b", "tiny:1b"], open_auth());
    gw.handle_message(message("1", "hi", false)).await;
    let texts = channel.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("❌ Error:"));
    assert!(texts[0].contains("tiny:1b unavailable"));
}

#[tokio::test]
async fn test_busy_sender_is_buffered() {
    let (gw, channel, _) = gateway(vec![], open_auth());
    gw.active_senders
        .lock()
        .await
        .insert("test:1".into(), Vec::new());

    // Sender is busy: both get buffered.
    gw.clone().dispatch_message(message("1", "first", false)).await;
    gw.clone().dispatch_message(message("1", "second", false)).await;
    assert!(channel.texts().is_empty());
    assert_eq!(gw.active_senders.lock().await["test:1"].len(), 2);

    // Another sender is not blocked.
    gw.clone().dispatch_message(message("2", "other", false)).await;
    assert_eq!(channel.texts(), vec!["small:3b: other"]);
    assert!(!gw.active_senders.lock().await.contains_key("test:2"));
}
