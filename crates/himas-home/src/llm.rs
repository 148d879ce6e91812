//! Language-model fallback parser.
//!
//! Used when the regex rules don't match a segment, and once more when
//! executing a parsed command failed (with the failure text as context).
//! The model is asked for exactly one JSON command; the first balanced
//! `{...}` region in its reply is extracted and validated.

use crate::command::{Action, Command, Parameters};
use crate::entity::EntitySnapshot;
use himas_core::{config::OllamaConfig, message::GenerateRequest, traits::Provider};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on the extracted JSON object, in bytes.
pub const MAX_OBJECT_LEN: usize = 8 * 1024;

/// Why no JSON object could be pulled out of a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON object in response")]
    NoObject,
    #[error("unbalanced braces in response")]
    Unbalanced,
    #[error("JSON object exceeds {MAX_OBJECT_LEN} bytes")]
    TooLarge,
}

/// Return the first balanced `{...}` region of `text`.
///
/// Braces inside JSON strings (including escaped quotes) are ignored. The
/// scan gives up after [`MAX_OBJECT_LEN`] bytes from the opening brace.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;
    let bytes = &text.as_bytes()[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if i >= MAX_OBJECT_LEN {
            return Err(ExtractError::TooLarge);
        }
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unbalanced)
}

/// Strip prompt role markers so user text can't open a new turn.
pub fn sanitize_segment(segment: &str) -> String {
    segment.replace("###", "").trim().to_string()
}

/// Asks a language model to turn one segment into a [`Command`].
pub struct LlmParser {
    provider: Arc<dyn Provider>,
    default_model: String,
    user_models: HashMap<String, String>,
    entity_limit: usize,
    temperature: f32,
    num_predict: u32,
}

impl LlmParser {
    pub fn new(provider: Arc<dyn Provider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            user_models: HashMap::new(),
            entity_limit: 80,
            temperature: 0.1,
            num_predict: 300,
        }
    }

    /// Model, sampling and per-user settings from the Ollama section.
    pub fn from_config(provider: Arc<dyn Provider>, config: &OllamaConfig) -> Self {
        let mut parser = Self::new(provider, config.model.clone());
        parser.user_models = config.user_models.clone();
        parser.temperature = config.temperature;
        parser.num_predict = config.num_predict;
        parser
    }

    /// Cap on `friendly_name -> entity_id` pairs put in the prompt.
    pub fn with_entity_limit(mut self, limit: usize) -> Self {
        self.entity_limit = limit;
        self
    }

    pub fn with_user_models(mut self, user_models: HashMap<String, String>) -> Self {
        self.user_models = user_models;
        self
    }

    fn model_for(&self, user_id: &str) -> &str {
        self.user_models
            .get(user_id)
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }

    /// One generate call; every failure becomes `Command::Error`.
    pub async fn parse(
        &self,
        segment: &str,
        user_id: &str,
        entities: &EntitySnapshot,
        error_context: Option<&str>,
    ) -> Command {
        let prompt = build_prompt(segment, entities, self.entity_limit, error_context);
        let request = GenerateRequest::new(prompt)
            .with_model(self.model_for(user_id))
            .with_temperature(self.temperature)
            .with_max_tokens(self.num_predict);

        let reply = match self.provider.generate(&request).await {
            Ok(g) => g.text,
            Err(e) => {
                warn!("LLM parse error: {e}");
                return parse_failure(segment);
            }
        };

        match interpret_reply(&reply) {
            Ok(cmd) => {
                debug!("LLM parsed {segment:?} as {cmd:?}");
                cmd
            }
            Err(reason) => {
                warn!("LLM parse error for {segment:?}: {reason}");
                parse_failure(segment)
            }
        }
    }
}

fn parse_failure(segment: &str) -> Command {
    Command::error(format!("Could not parse: {segment}"))
}

/// Build the instruction prompt.
///
/// The entity list takes the first `limit` entities in directory order and
/// keeps the ones that have a friendly name.
pub fn build_prompt(
    segment: &str,
    entities: &EntitySnapshot,
    limit: usize,
    error_context: Option<&str>,
) -> String {
    let segment = sanitize_segment(segment);
    let pairs: Vec<String> = entities
        .iter()
        .take(limit)
        .filter_map(|e| {
            e.friendly_name()
                .map(|name| format!("{name} -> {}", e.entity_id))
        })
        .collect();

    let retry = match error_context {
        Some(ctx) if !ctx.trim().is_empty() => format!(
            "\n\nPrevious attempt failed: {}. Suggest a valid command using the entity list \
             above (use friendly_name in entity_name).",
            sanitize_segment(ctx)
        ),
        _ => String::new(),
    };

    let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();

    format!(
        "### System:\n\
         You translate smart-home requests into one JSON command for Home Assistant.\n\n\
         Available entities (friendly_name -> entity_id):\n\
         {entity_list}\n\n\
         Reply with exactly one JSON object and nothing else:\n\
         - Control: {{\"type\": \"control\", \"action\": \"{action_list}\", \"entity_name\": \"friendly name from the list\", \"parameters\": {{}}}}\n\
         - Query: {{\"type\": \"query\", \"entity_name\": \"friendly name from the list\", \"parameters\": {{}}}}\n\n\
         set_brightness takes parameters.brightness (0-100). set_color takes parameters.color \
         (red, green, blue, white, warm white, ...). set_color_and_brightness takes both.\n\
         Use entity_name values from the list above.{retry}\n\n\
         ### User:\n\
         Convert to a Home Assistant command: {segment}\n\n\
         ### Assistant:\n",
        entity_list = pairs.join("\n"),
        action_list = actions.join("|"),
    )
}

/// Extract and validate the command in a model reply.
pub fn interpret_reply(reply: &str) -> Result<Command, String> {
    let raw = extract_json_object(reply).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))?;
    command_from_value(&value)
}

fn command_from_value(value: &Value) -> Result<Command, String> {
    let kind = value["type"].as_str().unwrap_or_default();
    let entity_name = value["entity_name"].as_str().unwrap_or_default().trim();

    match kind {
        "control" => {
            let action_name = value["action"].as_str().unwrap_or_default();
            let action =
                Action::parse(action_name).ok_or_else(|| format!("unknown action {action_name:?}"))?;
            if entity_name.is_empty() {
                return Err("missing entity_name".into());
            }
            let params = &value["parameters"];
            let parameters = Parameters {
                brightness: brightness_param(&params["brightness"]),
                color: color_param(&params["color"]),
            };
            Ok(Command::control(action, entity_name, parameters))
        }
        "query" => {
            if entity_name.is_empty() {
                return Err("missing entity_name".into());
            }
            Ok(Command::query(entity_name))
        }
        "error" => {
            let message = value["message"].as_str().unwrap_or("Could not parse command");
            Ok(Command::error(message))
        }
        other => Err(format!("unknown command type {other:?}")),
    }
}

fn brightness_param(v: &Value) -> Option<u8> {
    let pct = match v {
        Value::Number(n) => n.as_f64()?.round() as i64,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    Some(crate::command::clamp_brightness(pct))
}

fn color_param(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_lowercase()),
        Value::Array(items) if items.len() == 3 => {
            let parts: Option<Vec<String>> = items
                .iter()
                .map(|c| c.as_u64().map(|n| n.to_string()))
                .collect();
            parts.map(|p| p.join(","))
        }
        _ => None,
    }
}
