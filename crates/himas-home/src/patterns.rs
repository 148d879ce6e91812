//! Regex fast path for common phrasings.
//!
//! Rules are tried in a fixed order and the first match wins. Anything the
//! rules don't recognize returns `None` and goes to the language model.

use crate::color;
use crate::command::{Action, Command, Parameters};
use regex::Regex;
use std::sync::LazyLock;

const COLOR_ALT: &str =
    "warm white|cool white|red|green|blue|white|yellow|orange|purple|pink|cyan|magenta";

/// Brightness verbs stripped from entity names caught by the suffix rules.
const BRIGHTNESS_VERBS: [&str; 5] = ["brightness of ", "set ", "make ", "dim ", "change "];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static ON_OFF_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^(.+?)\s+(off|on)\s*$"));
static TO_AT_PCT_RE: LazyLock<Regex> =
    LazyLock::new(|| re(r"^(.+?)\s+(?:to|at)\s+(\d{1,3})\s*%$"));
static COLOR_PCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(&format!(
        r"^(?:set\s+)?(.+?)\s+(?:to\s+)?({COLOR_ALT})\s+(\d{{1,3}})\s*%$"
    ))
});
static PCT_RE: LazyLock<Regex> = LazyLock::new(|| re(r"^(.+?)\s+(\d{1,3})\s*%$"));
static SET_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?:set|change) (.+?) to (warm white|cool white|\w+)(?: color)?")
});

#[derive(Clone, Copy)]
enum Verb {
    Control(Action),
    Brightness,
    Query,
}

/// Verb-led phrasings, in priority order.
static VERB_RULES: LazyLock<Vec<(Regex, Verb)>> = LazyLock::new(|| {
    vec![
        (
            re(r"(?:turn on|switch on|enable) (.+?)(?: please)?$"),
            Verb::Control(Action::TurnOn),
        ),
        (
            re(r"(?:turn off|switch off|disable) (.+?)(?: please)?$"),
            Verb::Control(Action::TurnOff),
        ),
        (
            re(r"toggle (.+?)(?: please)?$"),
            Verb::Control(Action::Toggle),
        ),
        (re(r"set (.+?) (?:to |at )?(\d{1,3})%"), Verb::Brightness),
        (re(r"make (.+?) (\d{1,3})%"), Verb::Brightness),
        (re(r"dim (.+?) (?:to )?(\d{1,3})%"), Verb::Brightness),
        (re(r"brightness of (.+?) (?:to )?(\d{1,3})%"), Verb::Brightness),
        (re(r"change (.+?) (?:to )?(\d{1,3})%"), Verb::Brightness),
        (
            re(r"what(?:'s| is) the (?:temperature|status|state) of (.+?)\??\s*$"),
            Verb::Query,
        ),
        (
            re(r"\bis (.+?) (?:on|off|open|closed)\b"),
            Verb::Query,
        ),
    ]
});

/// Parse `input` with the fixed rule set. Never calls out; never fails.
pub fn parse(input: &str) -> Option<Command> {
    let text = input.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    // 1. "<entity> on|off". The whole prefix is the entity, verbatim.
    if let Some(c) = ON_OFF_RE.captures(&text) {
        let action = if &c[2] == "off" {
            Action::TurnOff
        } else {
            Action::TurnOn
        };
        return Some(Command::control(action, c[1].trim(), Parameters::default()));
    }

    // 2. "<entity> to|at N%"
    if let Some(c) = TO_AT_PCT_RE.captures(&text) {
        if let Some(cmd) = brightness_command(strip_brightness_verb(&c[1]), &c[2]) {
            return Some(cmd);
        }
    }

    // 3. "[set] <entity> <color> N%"
    if let Some(c) = COLOR_PCT_RE.captures(&text) {
        let color = c[2].to_string();
        if color::is_known(&color) {
            if let (Some(entity), Some(pct)) = (clean_entity(&c[1]), parse_pct(&c[3])) {
                return Some(Command::control(
                    Action::SetColorAndBrightness,
                    &entity,
                    Parameters::color_and_brightness(color, pct),
                ));
            }
        }
    }

    // 4. "<entity> N%"
    if let Some(c) = PCT_RE.captures(&text) {
        if let Some(cmd) = brightness_command(strip_brightness_verb(&c[1]), &c[2]) {
            return Some(cmd);
        }
    }

    // 5. verb-led table
    for (rule, verb) in VERB_RULES.iter() {
        let Some(c) = rule.captures(&text) else {
            continue;
        };
        let Some(entity) = clean_entity(&c[1]) else {
            continue;
        };
        return match *verb {
            Verb::Control(action) => Some(Command::control(action, &entity, Parameters::default())),
            Verb::Brightness => brightness_command(&entity, &c[2]),
            Verb::Query => Some(Command::query(&entity)),
        };
    }

    // 6. "set|change <entity> to <color>"
    if let Some(c) = SET_COLOR_RE.captures(&text) {
        let color = c[2].to_string();
        if color::is_known(&color) {
            if let Some(entity) = clean_entity(&c[1]) {
                return Some(Command::control(
                    Action::SetColor,
                    &entity,
                    Parameters::color(color),
                ));
            }
        }
    }

    None
}

fn brightness_command(raw_entity: &str, pct: &str) -> Option<Command> {
    let entity = clean_entity(raw_entity)?;
    let pct = parse_pct(pct)?;
    Some(Command::control(
        Action::SetBrightness,
        &entity,
        Parameters::brightness(pct),
    ))
}

fn parse_pct(s: &str) -> Option<i64> {
    s.parse().ok()
}

fn strip_brightness_verb(raw: &str) -> &str {
    let raw = raw.trim();
    BRIGHTNESS_VERBS
        .iter()
        .find_map(|verb| raw.strip_prefix(verb))
        .unwrap_or(raw)
}

/// Trim and drop a leading article. `None` if nothing is left.
fn clean_entity(raw: &str) -> Option<String> {
    let name = raw.trim();
    let name = name.strip_prefix("the ").unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(input: &str) -> (Action, String, Parameters) {
        match parse(input) {
            Some(Command::Control {
                action,
                entity_name,
                parameters,
            }) => (action, entity_name, parameters),
            other => panic!("expected control for {input:?}, got {other:?}"),
        }
    }

    fn query(input: &str) -> String {
        match parse(input) {
            Some(Command::Query { entity_name, .. }) => entity_name,
            other => panic!("expected query for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_on_off_suffix() {
        let (action, entity, params) = control("living room light off");
        assert_eq!(action, Action::TurnOff);
        assert_eq!(entity, "living room light");
        assert_eq!(params, Parameters::default());

        let (action, entity, _) = control("  Kitchen ON ");
        assert_eq!(action, Action::TurnOn);
        assert_eq!(entity, "kitchen");
    }

    #[test]
    fn test_on_off_keeps_whole_prefix() {
        let (action, entity, _) = control("turn the porch light on");
        assert_eq!(action, Action::TurnOn);
        assert_eq!(entity, "turn the porch light");

        let (action, entity, _) = control("the lamp off");
        assert_eq!(action, Action::TurnOff);
        assert_eq!(entity, "the lamp");

        // Suffix rule wins over the question form.
        let (action, entity, _) = control("is the lamp on");
        assert_eq!(action, Action::TurnOn);
        assert_eq!(entity, "is the lamp");
    }

    #[test]
    fn test_brightness_phrasings() {
        for input in [
            "ceiling to 50%",
            "ceiling at 50%",
            "ceiling 50%",
            "set ceiling to 50%",
            "dim ceiling to 50%",
            "make ceiling 50%",
            "set the ceiling at 50 %",
        ] {
            let (action, entity, params) = control(input);
            assert_eq!(action, Action::SetBrightness, "{input}");
            assert_eq!(entity, "ceiling", "{input}");
            assert_eq!(params.brightness, Some(50), "{input}");
        }
    }

    #[test]
    fn test_brightness_clamped() {
        let (_, entity, params) = control("set ceiling to 150%");
        assert_eq!(entity, "ceiling");
        assert_eq!(params.brightness, Some(100));

        let (_, _, params) = control("desk 999%");
        assert_eq!(params.brightness, Some(100));

        let (_, _, params) = control("desk 0%");
        assert_eq!(params.brightness, Some(0));
    }

    #[test]
    fn test_color_and_brightness_beats_shorthand() {
        let (action, entity, params) = control("lamp blue 50%");
        assert_eq!(action, Action::SetColorAndBrightness);
        assert_eq!(entity, "lamp");
        assert_eq!(params.color.as_deref(), Some("blue"));
        assert_eq!(params.brightness, Some(50));
    }

    #[test]
    fn test_color_and_brightness_variants() {
        let (_, entity, params) = control("set bedroom lamp warm white 30%");
        assert_eq!(entity, "bedroom lamp");
        assert_eq!(params.color.as_deref(), Some("warm white"));

        let (_, entity, params) = control("bedroom lamp to red 80%");
        assert_eq!(entity, "bedroom lamp");
        assert_eq!(params.color.as_deref(), Some("red"));
        assert_eq!(params.brightness, Some(80));
    }

    #[test]
    fn test_unknown_color_with_pct_is_brightness_only() {
        let (action, entity, params) = control("lamp mauve 40%");
        assert_eq!(action, Action::SetBrightness);
        assert_eq!(entity, "lamp mauve");
        assert_eq!(params.brightness, Some(40));
        assert_eq!(params.color, None);
    }

    #[test]
    fn test_verb_led_controls() {
        assert_eq!(control("turn on the hallway").0, Action::TurnOn);
        assert_eq!(control("switch off fan please").1, "fan");
        assert_eq!(control("enable garden pump").1, "garden pump");
        assert_eq!(control("disable garden pump").0, Action::TurnOff);

        let (action, entity, _) = control("toggle desk lamp");
        assert_eq!(action, Action::Toggle);
        assert_eq!(entity, "desk lamp");
    }

    #[test]
    fn test_verb_led_brightness_without_trailing_pct() {
        let (action, entity, params) = control("set the desk to 30% please");
        assert_eq!(action, Action::SetBrightness);
        assert_eq!(entity, "desk");
        assert_eq!(params.brightness, Some(30));
    }

    #[test]
    fn test_queries() {
        assert_eq!(query("is the garage door open"), "garage door");
        assert_eq!(query("is kitchen light on?"), "kitchen light");
        assert_eq!(query("is the lamp on right now"), "lamp");
        assert_eq!(query("is the gate closed at the moment?"), "gate");
        assert_eq!(query("what is the temperature of living room sensor?"), "living room sensor");
        assert_eq!(query("what's the status of washer"), "washer");
    }

    #[test]
    fn test_set_color() {
        let (action, entity, params) = control("set lamp to green");
        assert_eq!(action, Action::SetColor);
        assert_eq!(entity, "lamp");
        assert_eq!(params.color.as_deref(), Some("green"));
        assert_eq!(params.brightness, None);

        let (_, entity, params) = control("change the strip to cool white color");
        assert_eq!(entity, "strip");
        assert_eq!(params.color.as_deref(), Some("cool white"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse("make it cozy in here"), None);
        assert_eq!(parse("set lamp to chartreuse"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }
}
