//! Free text → entity id.
//!
//! First structural hit wins; matches are not ranked, so "kitchen light"
//! may pick "Kitchen Light Strip" if that entity comes first.

use crate::aliases::AliasTable;
use crate::entity::{Entity, EntitySnapshot};
use regex::Regex;
use std::sync::LazyLock;

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(light|switch|sensor|binary_sensor|climate|fan|cover|media_player)\s+(.+)$")
        .expect("valid regex")
});

/// Resolve `reference` against the snapshot, then the alias table.
///
/// An alias only resolves to an entity that is in the snapshot, so aliases
/// cannot reach entities the allowlist hides.
pub fn resolve_entity(
    reference: &str,
    entities: &EntitySnapshot,
    aliases: &AliasTable,
) -> Option<String> {
    if reference.trim().is_empty() {
        return None;
    }
    let wanted = reference.to_lowercase();
    let underscored = wanted.replace(' ', "_");
    let friendly = |e: &Entity| e.friendly_name().unwrap_or_default().to_lowercase();

    // Exact friendly name.
    if let Some(e) = entities.iter().find(|e| friendly(e) == wanted) {
        return Some(e.entity_id.clone());
    }

    // Partial: inside a friendly name, or underscored inside the id.
    if let Some(e) = entities
        .iter()
        .find(|e| friendly(e).contains(&wanted) || e.entity_id.contains(&underscored))
    {
        return Some(e.entity_id.clone());
    }

    // "<domain> <fragment>"
    if let Some(c) = DOMAIN_RE.captures(&wanted) {
        let prefix = format!("{}.", &c[1]);
        let fragment = c[2].replace(' ', "_");
        if let Some(e) = entities
            .iter()
            .find(|e| e.entity_id.starts_with(&prefix) && e.entity_id.contains(&fragment))
        {
            return Some(e.entity_id.clone());
        }
    }

    aliases
        .get(reference)
        .filter(|id| entities.get(id).is_some())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EntitySnapshot {
        EntitySnapshot::new(vec![
            Entity::new("light.living_room", "on")
                .with_attribute("friendly_name", "Living Room Light"),
            Entity::new("light.kitchen_strip", "off")
                .with_attribute("friendly_name", "Kitchen Light Strip"),
            Entity::new("light.kitchen", "off").with_attribute("friendly_name", "Kitchen Light"),
            Entity::new("sensor.outdoor_temp", "12").with_attribute("friendly_name", "Outside"),
            Entity::new("switch.garden_pump_2", "off"),
        ])
    }

    #[test]
    fn test_exact_friendly_name_case_insensitive() {
        let snap = snapshot();
        let aliases = AliasTable::in_memory();
        assert_eq!(
            resolve_entity("living room light", &snap, &aliases).as_deref(),
            Some("light.living_room")
        );
        // Exact beats an earlier partial hit.
        assert_eq!(
            resolve_entity("KITCHEN LIGHT", &snap, &aliases).as_deref(),
            Some("light.kitchen")
        );
    }

    #[test]
    fn test_partial_match_is_first_in_order() {
        let snap = snapshot();
        let aliases = AliasTable::in_memory();
        assert_eq!(
            resolve_entity("kitchen", &snap, &aliases).as_deref(),
            Some("light.kitchen_strip")
        );
        assert_eq!(
            resolve_entity("outdoor temp", &snap, &aliases).as_deref(),
            Some("sensor.outdoor_temp")
        );
    }

    #[test]
    fn test_domain_qualified_fragment() {
        let snap = snapshot();
        let aliases = AliasTable::in_memory();
        assert_eq!(
            resolve_entity("switch pump", &snap, &aliases).as_deref(),
            Some("switch.garden_pump_2")
        );
        assert_eq!(resolve_entity("light pump", &snap, &aliases), None);
    }

    #[test]
    fn test_alias_is_last_resort() {
        let snap = snapshot();
        let mut aliases = AliasTable::in_memory();
        aliases.insert("thingamajig", "switch.garden_pump_2");
        aliases.insert("kitchen", "light.somewhere_else");

        assert_eq!(
            resolve_entity("Thingamajig", &snap, &aliases).as_deref(),
            Some("switch.garden_pump_2")
        );
        assert_eq!(
            resolve_entity("kitchen", &snap, &aliases).as_deref(),
            Some("light.kitchen_strip")
        );
    }

    #[test]
    fn test_alias_to_entity_outside_snapshot() {
        let mut aliases = AliasTable::in_memory();
        aliases.insert("gate", "cover.front_gate");
        assert_eq!(resolve_entity("gate", &snapshot(), &aliases), None);
    }

    #[test]
    fn test_unknown_reference() {
        assert_eq!(
            resolve_entity("thingamajig", &snapshot(), &AliasTable::in_memory()),
            None
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let snap = snapshot();
        let aliases = AliasTable::in_memory();
        for reference in ["kitchen", "living room light", "switch pump", "nothing"] {
            let first = resolve_entity(reference, &snap, &aliases);
            for _ in 0..3 {
                assert_eq!(resolve_entity(reference, &snap, &aliases), first);
            }
        }
    }
}
