//! Structured commands produced by the parsers.

use serde::{Deserialize, Serialize};

/// Device-control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TurnOn,
    TurnOff,
    Toggle,
    SetBrightness,
    SetColor,
    SetColorAndBrightness,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::TurnOn,
        Action::TurnOff,
        Action::Toggle,
        Action::SetBrightness,
        Action::SetColor,
        Action::SetColorAndBrightness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Toggle => "toggle",
            Self::SetBrightness => "set_brightness",
            Self::SetColor => "set_color",
            Self::SetColorAndBrightness => "set_color_and_brightness",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s.trim())
    }

    /// The Home Assistant service that carries out this action.
    pub fn service(&self) -> &'static str {
        match self {
            Self::TurnOff => "turn_off",
            Self::Toggle => "toggle",
            Self::TurnOn | Self::SetBrightness | Self::SetColor | Self::SetColorAndBrightness => {
                "turn_on"
            }
        }
    }

    /// Human phrasing: `turn_off` → "turn off".
    pub fn words(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional action parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    /// Percent, always within 0–100.
    pub brightness: Option<u8>,
    /// Table color name or `"r,g,b"` literal.
    pub color: Option<String>,
}

impl Parameters {
    pub fn brightness(pct: i64) -> Self {
        Self {
            brightness: Some(clamp_brightness(pct)),
            color: None,
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            brightness: None,
            color: Some(color.into()),
        }
    }

    pub fn color_and_brightness(color: impl Into<String>, pct: i64) -> Self {
        Self {
            brightness: Some(clamp_brightness(pct)),
            color: Some(color.into()),
        }
    }
}

/// Clamp a parsed percentage into 0–100.
pub fn clamp_brightness(pct: i64) -> u8 {
    pct.clamp(0, 100) as u8
}

/// What one sub-command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Control {
        action: Action,
        entity_name: String,
        parameters: Parameters,
    },
    Query {
        entity_name: String,
        /// Reserved for future filters.
        parameters: Parameters,
    },
    /// Terminal: nothing to execute.
    Error { message: String },
}

impl Command {
    /// A control command, or `Error` when the entity name is blank.
    pub fn control(action: Action, entity_name: &str, parameters: Parameters) -> Self {
        match non_empty(entity_name) {
            Some(name) => Self::Control {
                action,
                entity_name: name,
                parameters,
            },
            None => Self::error("No entity specified"),
        }
    }

    /// A query command, or `Error` when the entity name is blank.
    pub fn query(entity_name: &str) -> Self {
        match non_empty(entity_name) {
            Some(name) => Self::Query {
                entity_name: name,
                parameters: Parameters::default(),
            },
            None => Self::error("No entity specified"),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn entity_name(&self) -> Option<&str> {
        match self {
            Self::Control { entity_name, .. } | Self::Query { entity_name, .. } => {
                Some(entity_name)
            }
            Self::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

fn non_empty(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
