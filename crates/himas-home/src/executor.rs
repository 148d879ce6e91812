//! Runs a parsed command against Home Assistant.

use crate::client::HomeApi;
use crate::color;
use crate::command::{Action, Command, Parameters};
use crate::entity::{domain_of, Entity};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Fade used for brightness changes, in seconds.
const BRIGHTNESS_TRANSITION: f64 = 0.3;

/// Result of executing one command. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    /// State returned by a query.
    pub state: Option<Entity>,
    /// The entity name could not be resolved to an id.
    pub unresolved: bool,
}

impl ExecutionOutcome {
    fn ok(message: impl Into<String>, state: Option<Entity>) -> Self {
        Self {
            success: true,
            message: message.into(),
            state,
            unresolved: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            state: None,
            unresolved: false,
        }
    }

    /// Resolution failure for `name`, pointing at `/explain`.
    pub fn unresolved(name: &str) -> Self {
        Self {
            unresolved: true,
            ..Self::failed(format!(
                "Could not find entity: \"{name}\". Use /explain to add a mapping, \
                 e.g. /explain \"{name}\" light.your_entity_id"
            ))
        }
    }
}

/// Execute `command` against the already-resolved `entity_id`.
pub async fn execute(api: &dyn HomeApi, command: &Command, entity_id: &str) -> ExecutionOutcome {
    match command {
        Command::Control {
            action, parameters, ..
        } => control(api, *action, parameters, entity_id).await,
        Command::Query { .. } => query(api, entity_id).await,
        Command::Error { message } => ExecutionOutcome::failed(message.clone()),
    }
}

async fn control(
    api: &dyn HomeApi,
    action: Action,
    parameters: &Parameters,
    entity_id: &str,
) -> ExecutionOutcome {
    let Some(domain) = domain_of(entity_id) else {
        return ExecutionOutcome::failed(format!("Invalid entity ID: {entity_id}"));
    };

    let data = service_data(action, parameters, entity_id);
    debug!("{domain}.{} {data}", action.service());

    match api.call_service(domain, action.service(), &data).await {
        Ok(()) => {
            let brightness = parameters.brightness.unwrap_or(100);
            let message = match action {
                Action::SetBrightness => format!("Set brightness to {brightness}%"),
                Action::SetColorAndBrightness => format!(
                    "Set to {} at {brightness}%",
                    parameters.color.as_deref().unwrap_or("white")
                ),
                _ => "Command executed successfully".to_string(),
            };
            ExecutionOutcome::ok(message, None)
        }
        Err(e) => {
            warn!("service call {domain}.{} on {entity_id} failed: {e}", action.service());
            ExecutionOutcome::failed(e.to_string())
        }
    }
}

/// JSON body for the service call.
pub fn service_data(action: Action, parameters: &Parameters, entity_id: &str) -> Value {
    let mut data = json!({ "entity_id": entity_id });
    let brightness = parameters.brightness.unwrap_or(100);
    let rgb = || color::resolve(parameters.color.as_deref().unwrap_or("white"));

    match action {
        Action::SetBrightness => {
            data["brightness_pct"] = json!(brightness);
            data["transition"] = json!(BRIGHTNESS_TRANSITION);
        }
        Action::SetColorAndBrightness => {
            data["brightness_pct"] = json!(brightness);
            data["transition"] = json!(BRIGHTNESS_TRANSITION);
            data["rgb_color"] = json!(rgb());
        }
        Action::SetColor => {
            data["rgb_color"] = json!(rgb());
        }
        Action::TurnOn | Action::TurnOff | Action::Toggle => {}
    }
    data
}

async fn query(api: &dyn HomeApi, entity_id: &str) -> ExecutionOutcome {
    let Some(entity) = api.fetch_state(entity_id).await else {
        return ExecutionOutcome::failed(format!("Entity {entity_id} not found"));
    };
    let message = describe_state(&entity);
    ExecutionOutcome::ok(message, Some(entity))
}

/// One-line description of an entity's state, shaped by its domain.
pub fn describe_state(entity: &Entity) -> String {
    let name = entity.display_name();
    let state = &entity.state;
    match (entity.domain(), entity.brightness()) {
        (Some("sensor"), _) => format!("{name}: {state}{}", entity.unit()),
        (Some("binary_sensor"), _) => format!("{name} is {state}"),
        (Some("light"), Some(raw)) => {
            let pct = (raw / 255.0 * 100.0).round() as i64;
            format!("{name}: {state} (brightness: {pct}%)")
        }
        _ => format!("{name}: {state}"),
    }
}
