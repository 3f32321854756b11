//! Local API key store ("the vending machine").
//!
//! `<home>/keystore.json` is a flat JSON object mapping bot names to API keys:
//!
//! ```json
//! {
//!   "_comment": "Claude Key Vending Machine - DO NOT commit to git",
//!   "_updated": "2026-10-18 09:30",
//!   "BLACK": "cc_...",
//!   "INTOLERANT": "cc_..."
//! }
//! ```
//!
//! Entries whose name starts with `_` are metadata, never bot keys.

use crate::error::{ColabError, Result};
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const KEYSTORE_COMMENT: &str = "Claude Key Vending Machine - DO NOT commit to git";

/// Prefix every valid API key is expected to carry.
pub const KEY_PREFIX: &str = "cc_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keystore {
    #[serde(rename = "_comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "_updated", default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(flatten)]
    keys: BTreeMap<String, String>,
}

impl Keystore {
    pub fn new() -> Self {
        Self {
            comment: Some(KEYSTORE_COMMENT.to_string()),
            updated: None,
            keys: BTreeMap::new(),
        }
    }

    /// Load the keystore at `path`. A missing file is an empty keystore.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| ColabError::Malformed {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Write the keystore atomically, stamping `_updated`, and restrict it to the owner.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated = Some(chrono::Local::now().format("%Y-%m-%d %H:%M").to_string());
        io::write_json(path, self)?;
        io::set_private(path)?;
        debug!(path = %path.display(), keys = self.len(), "keystore saved");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.keys
            .get(&paths::normalize_bot_name(name))
            .map(String::as_str)
    }

    /// Insert or replace the key for `name`. Returns the previous key, if any.
    pub fn set(&mut self, name: &str, key: &str) -> Option<String> {
        self.keys
            .insert(paths::normalize_bot_name(name), key.trim().to_string())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.keys.remove(&paths::normalize_bot_name(name))
    }

    /// Bot names with a stored key, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|(name, _)| name).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, key)| (name.as_str(), key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a bot's key from `<home>/keystore.json`.
pub fn vend_key(home: &Path, name: &str) -> Result<Option<String>> {
    let store = Keystore::load(&paths::keystore_path(home))?;
    Ok(store.get(name).map(str::to_string))
}

/// Add or replace a bot's key in `<home>/keystore.json`.
pub fn stock_key(home: &Path, name: &str, key: &str) -> Result<()> {
    let path = paths::keystore_path(home);
    let mut store = Keystore::load(&path)?;
    store.set(name, key);
    store.save(&path)
}

/// True when `key` carries the expected `cc_` prefix.
pub fn looks_valid(key: &str) -> bool {
    key.trim().starts_with(KEY_PREFIX)
}

/// Display form of a key: first and last four characters only.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = Keystore::load(&dir.path().join("keystore.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn stock_then_vend_round_trips() {
        let dir = TempDir::new().unwrap();
        stock_key(dir.path(), "black", "cc_black_key_123").unwrap();
        stock_key(dir.path(), "INTOLERANT", "cc_intolerant_456").unwrap();

        assert_eq!(
            vend_key(dir.path(), "BLACK").unwrap().as_deref(),
            Some("cc_black_key_123")
        );
        assert_eq!(
            vend_key(dir.path(), "intolerant").unwrap().as_deref(),
            Some("cc_intolerant_456")
        );
        assert_eq!(vend_key(dir.path(), "OLLAMA").unwrap(), None);
    }

    #[test]
    fn file_format_is_flat_object_with_metadata() {
        let dir = TempDir::new().unwrap();
        stock_key(dir.path(), "BOT1", "cc_abc").unwrap();
        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths::keystore_path(dir.path())).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["BOT1"], "cc_abc");
        assert_eq!(raw["_comment"], KEYSTORE_COMMENT);
        assert!(raw["_updated"].is_string());
    }

    #[test]
    fn reads_plain_map_written_by_hand() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystore.json");
        std::fs::write(&path, r#"{"BOT1": "cc_one", "BOT2": "cc_two"}"#).unwrap();
        let store = Keystore::load(&path).unwrap();
        assert_eq!(store.names(), vec!["BOT1", "BOT2"]);
        assert_eq!(store.comment, None);
    }

    #[test]
    fn metadata_entries_are_not_bots() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystore.json");
        std::fs::write(&path, r#"{"_note": "hi", "BOT1": "cc_one"}"#).unwrap();
        let store = Keystore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_replaces_existing_key() {
        let mut store = Keystore::new();
        assert_eq!(store.set("bot1", "cc_old"), None);
        assert_eq!(store.set("BOT1", "cc_new").as_deref(), Some("cc_old"));
        assert_eq!(store.get("Bot1"), Some("cc_new"));
        assert_eq!(store.remove("bot1").as_deref(), Some("cc_new"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keystore.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Keystore::load(&path),
            Err(ColabError::Malformed { .. })
        ));
    }

    #[test]
    fn masks_keys() {
        assert_eq!(mask_key("cc_1234567890abcdef"), "cc_1...cdef");
        assert_eq!(mask_key("short"), "***");
        assert!(looks_valid("cc_abc"));
        assert!(!looks_valid("sk-abc"));
    }
}
