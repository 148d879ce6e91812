//! Home Assistant command handlers: /himas, /explain, /listentities,
//! /removeentity, /find-sensor, /ha-status, /help.

use himas_home::{error::truncate, HomeInterpreter};
use tracing::warn;

/// Entities listed by `/find-sensor` before the "more" footer.
const FIND_SENSOR_LIMIT: usize = 10;

const EMPTY_REPLY: &str =
    "No response. Check your command or use /listentities to see available devices.";

pub(super) async fn handle_himas(home: &HomeInterpreter, args: &str, sender_id: &str) -> String {
    if args.is_empty() {
        return "Usage: /himas <command>\nExample: /himas kitchen light off, bedroom lamp blue 40%"
            .to_string();
    }
    let reply = home.process_natural_command(args, sender_id).await;
    if reply.trim().is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        reply
    }
}

/// Split `/explain` arguments into a friendly name and an entity id.
///
/// Accepts `"living room light" light.living_room` or the unquoted
/// `living room light light.living_room` (last word is the entity id).
pub(super) fn parse_explain_args(args: &str) -> Option<(String, String)> {
    let args = args.trim();
    let (name, entity_id) = if let Some(rest) = args.strip_prefix('"') {
        let (name, tail) = rest.split_once('"')?;
        (name.trim(), tail.trim())
    } else {
        let (name, entity_id) = args.rsplit_once(char::is_whitespace)?;
        (name.trim(), entity_id.trim())
    };

    if name.is_empty() || entity_id.contains(char::is_whitespace) {
        return None;
    }
    let (domain, object) = entity_id.split_once('.')?;
    if domain.is_empty() || object.is_empty() {
        return None;
    }
    Some((name.to_string(), entity_id.to_string()))
}

pub(super) async fn handle_explain(home: &HomeInterpreter, args: &str) -> String {
    let Some((name, entity_id)) = parse_explain_args(args) else {
        return "Usage: /explain \"living room light\" light.living_room".to_string();
    };

    let mut aliases = home.aliases().write().await;
    aliases.reload();
    aliases.insert(&name, &entity_id);
    match aliases.save() {
        Ok(()) => format!("✅ Mapped \"{name}\" to {entity_id}"),
        Err(e) => {
            warn!("saving alias table failed: {e}");
            format!("❌ Error: {}", truncate(&e.to_string(), 100))
        }
    }
}

pub(super) async fn handle_list(home: &HomeInterpreter) -> String {
    let mut aliases = home.aliases().write().await;
    aliases.reload();
    if aliases.is_empty() {
        return "📭 No entity mappings found.".to_string();
    }
    let mut out = String::from("🏠 Entity Mappings");
    for (name, entity_id) in aliases.iter() {
        out.push_str(&format!("\n• {name} → {entity_id}"));
    }
    out
}

pub(super) async fn handle_remove(home: &HomeInterpreter, args: &str) -> String {
    let name = args.trim().trim_matches('"').trim();
    if name.is_empty() {
        return "Usage: /removeentity \"living room light\"".to_string();
    }

    let mut aliases = home.aliases().write().await;
    aliases.reload();
    if aliases.remove(name).is_none() {
        return format!("❌ No mapping found for \"{name}\"");
    }
    match aliases.save() {
        Ok(()) => format!("✅ Removed mapping for \"{name}\""),
        Err(e) => {
            warn!("saving alias table failed: {e}");
            format!("❌ Error: {}", truncate(&e.to_string(), 100))
        }
    }
}

pub(super) async fn handle_find_sensor(home: &HomeInterpreter, search: &str) -> String {
    let snapshot = home.directory().entities(true).await;
    let needle = search.to_lowercase();
    let matches: Vec<_> = snapshot
        .iter()
        .filter(|e| needle.is_empty() || e.entity_id.to_lowercase().contains(&needle))
        .collect();

    let suffix = if search.is_empty() {
        String::new()
    } else {
        format!(" matching \"{search}\"")
    };

    if matches.is_empty() {
        return format!("🔍 No entities found{suffix}.");
    }

    let mut out = format!("🔍 Sensors{suffix}");
    for entity in matches.iter().take(FIND_SENSOR_LIMIT) {
        let unit = entity.unit();
        let state = if unit.is_empty() {
            entity.state.clone()
        } else {
            format!("{} {unit}", entity.state)
        };
        out.push_str(&format!(
            "\n\n{}\nID: {}\nState: {state}",
            entity.display_name(),
            entity.entity_id
        ));
    }
    if matches.len() > FIND_SENSOR_LIMIT {
        out.push_str(&format!(
            "\n\nAnd {} more entities...",
            matches.len() - FIND_SENSOR_LIMIT
        ));
    }
    out
}

pub(super) async fn handle_ha_status(home: &HomeInterpreter) -> String {
    match home.api().api_status().await {
        Ok(message) => {
            let entities = home.directory().entities(true).await.len();
            let mappings = {
                let mut aliases = home.aliases().write().await;
                aliases.reload();
                aliases.len()
            };
            let version = if message.is_empty() {
                "Unknown".to_string()
            } else {
                message
            };
            format!(
                "🏠 Home Assistant Status\n\
                 Status: ✅ Connected\n\
                 Version: {version}\n\
                 Entities: {entities}\n\
                 Mappings: {mappings}"
            )
        }
        Err(e) => format!(
            "🏠 Home Assistant Status\n\
             Status: ❌ Disconnected\n\
             Error: {}",
            truncate(&e.to_string(), 200)
        ),
    }
}

pub(super) fn handle_help() -> String {
    "🏠 Himas commands\n\
     /himas <command>: control or query devices, e.g. /himas kitchen light off\n\
     /explain \"<name>\" <entity_id>: map a name to an entity\n\
     /listentities: list custom mappings\n\
     /removeentity <name>: remove a mapping (admin)\n\
     /find-sensor [search]: search entity ids\n\
     /ha-status: Home Assistant connection status\n\
     /help: this message\n\
     \n\
     In groups, start a message with the wake word to chat."
        .to_string()
}
