//! User-curated name → entity id mappings (`/explain`).
//!
//! Stored as a flat JSON object keyed by lowercase friendly name.

use himas_core::error::HimasError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    /// An empty table that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file is an empty table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HimasError> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path)?;
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Like [`load`](Self::load), but an unreadable or malformed file gives
    /// an empty table still bound to `path`.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::load(&path).unwrap_or_else(|e| {
            warn!("ignoring alias file {}: {e}", path.display());
            Self {
                path: Some(path),
                entries: BTreeMap::new(),
            }
        })
    }

    /// Re-read the backing file so edits made by other writers are seen.
    /// A file that can't be read or parsed leaves the table empty.
    pub fn reload(&mut self) {
        let Some(path) = &self.path else {
            return;
        };
        match read_entries(path) {
            Ok(entries) => self.entries = entries,
            Err(e) => {
                warn!("ignoring alias file {}: {e}", path.display());
                self.entries.clear();
            }
        }
    }

    /// Write the table back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), HimasError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Look up `name`, first as lowercased, then trimmed and lowercased.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_lowercase())
            .or_else(|| self.entries.get(&name.trim().to_lowercase()))
            .map(String::as_str)
    }

    /// Add or replace a mapping. Returns the previous entity id, if any.
    pub fn insert(&mut self, name: &str, entity_id: &str) -> Option<String> {
        let key = name.trim().to_lowercase();
        info!("alias {key:?} -> {entity_id}");
        self.entries.insert(key, entity_id.trim().to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, HimasError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&content)?)
}
