//! User-facing rendering of execution outcomes.

use crate::command::{Action, Command};
use crate::executor::ExecutionOutcome;

const RESOLUTION_HINT: &str = "\n\nTry:\n- Using /listentities to see available devices\n- Using /explain to add device mappings";

/// Render one sub-command's outcome.
pub fn format_response(command: &Command, outcome: &ExecutionOutcome) -> String {
    if !outcome.success {
        let hint = if outcome.unresolved { RESOLUTION_HINT } else { "" };
        return format!("❌ {}{hint}", outcome.message);
    }

    match command {
        Command::Query { .. } => format!("📊 {}", outcome.message),
        Command::Control {
            action,
            entity_name,
            parameters,
        } => {
            let name = outcome
                .state
                .as_ref()
                .and_then(|e| e.friendly_name())
                .unwrap_or(entity_name);
            let name = title_case(name);
            let brightness = parameters.brightness.unwrap_or(100);
            match action {
                Action::SetBrightness => format!("✅ {name} brightness set to {brightness}%"),
                Action::SetColorAndBrightness => format!(
                    "✅ {name} set to {} at {brightness}%",
                    parameters.color.as_deref().unwrap_or("white")
                ),
                _ => format!("✅ {name} {}.\n{}", action.words(), outcome.message),
            }
        }
        Command::Error { message } => format!("❌ {message}"),
    }
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
///
/// `"living room light"` → `"Living Room Light"`, `"tv2go"` → `"Tv2Go"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
