//! Home Assistant entity objects as returned by `/api/states`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// An addressable smart-home device or sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// `<domain>.<name>`, e.g. `light.living_room`.
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Builder used mostly by tests and fakes.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Friendly name, or the entity id when none is set.
    pub fn display_name(&self) -> &str {
        self.friendly_name().unwrap_or(&self.entity_id)
    }

    /// The part of the id before the first `.`, if any.
    pub fn domain(&self) -> Option<&str> {
        domain_of(&self.entity_id)
    }

    pub fn unit(&self) -> &str {
        self.attributes
            .get("unit_of_measurement")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Raw brightness attribute (0–255), if the entity reports one.
    pub fn brightness(&self) -> Option<f64> {
        self.attributes.get("brightness").and_then(Value::as_f64)
    }
}

/// Domain prefix of an entity id (`light.kitchen` → `light`).
pub fn domain_of(entity_id: &str) -> Option<&str> {
    entity_id
        .split_once('.')
        .map(|(domain, _)| domain)
        .filter(|d| !d.is_empty())
}

/// One refresh worth of entities, in the order Home Assistant returned them.
///
/// Snapshots are immutable: a refresh builds a new one and swaps it in whole.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl EntitySnapshot {
    /// Build a snapshot. Later duplicates of an id replace earlier ones in place.
    pub fn new(entities: Vec<Entity>) -> Self {
        let mut out: Vec<Entity> = Vec::with_capacity(entities.len());
        let mut index = HashMap::with_capacity(entities.len());
        for e in entities {
            match index.get(&e.entity_id) {
                Some(&i) => out[i] = e,
                None => {
                    index.insert(e.entity_id.clone(), out.len());
                    out.push(e);
                }
            }
        }
        Self {
            entities: out,
            index,
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.index.get(entity_id).map(|&i| &self.entities[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Keep only ids in `allowed`. An empty list keeps everything.
    pub fn retain_allowed(self, allowed: &[String]) -> Self {
        if allowed.is_empty() {
            return self;
        }
        Self::new(
            self.entities
                .into_iter()
                .filter(|e| allowed.iter().any(|a| a == &e.entity_id))
                .collect(),
        )
    }
}
