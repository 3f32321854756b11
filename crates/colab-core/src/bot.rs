//! Bot roster, rank hierarchy, and per-bot `settings.json`.
//!
//! A bot may edit another bot's settings only when its role strictly
//! outranks the target's. Bots without a config (or without a role) rank
//! as [`Role::Bot`].

use crate::config::BotConfig;
use crate::error::{ColabError, Result};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Bot,
    Grunt,
    Worker,
    Manager,
    Supervisor,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Role::Supervisor,
            Role::Manager,
            Role::Worker,
            Role::Grunt,
            Role::Bot,
        ]
    }

    /// Higher is more senior.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn outranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
            Role::Worker => "worker",
            Role::Grunt => "grunt",
            Role::Bot => "bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ColabError;

    fn from_str(s: &str) -> Result<Self> {
        Role::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ColabError::InvalidRole(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Names of every bot folder under `home` (folders holding a `config.json`), sorted.
pub fn list_bots(home: &Path) -> Result<Vec<String>> {
    if !home.is_dir() {
        return Err(ColabError::NotInstalled(home.display().to_string()));
    }
    let mut bots = Vec::new();
    for entry in std::fs::read_dir(home)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if BotConfig::exists(home, &name) {
            bots.push(name);
        }
    }
    bots.sort();
    Ok(bots)
}

pub fn role_of(home: &Path, name: &str) -> Role {
    BotConfig::load(home, &paths::normalize_bot_name(name))
        .map(|cfg| cfg.role)
        .unwrap_or_default()
}

pub fn can_manage(home: &Path, manager: &str, target: &str) -> bool {
    role_of(home, manager).outranks(role_of(home, target))
}

fn check_authority(home: &Path, manager: Option<&str>, target: &str) -> Result<()> {
    match manager {
        Some(m) if !can_manage(home, m, target) => Err(ColabError::PermissionDenied {
            manager: paths::normalize_bot_name(m),
            target: target.to_string(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// A bot's `settings.json`, or `None` if the bot, the file, or its contents are unusable.
pub fn get_bot_settings(home: &Path, name: &str) -> Option<Map<String, Value>> {
    let path = paths::bot_settings_path(home, &paths::normalize_bot_name(name));
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(path = %path.display(), "settings.json is not an object");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), "unreadable settings.json: {e}");
            None
        }
    }
}

/// Merge `patch` into a bot's settings one level deep and write the result back.
///
/// Object values merge key-by-key into an existing object; anything else replaces.
pub fn set_bot_settings(
    home: &Path,
    name: &str,
    patch: &Map<String, Value>,
    manager: Option<&str>,
) -> Result<Map<String, Value>> {
    let name = paths::normalize_bot_name(name);
    check_authority(home, manager, &name)?;
    if !paths::bot_dir(home, &name).is_dir() {
        return Err(ColabError::BotNotFound(name));
    }

    let path = paths::bot_settings_path(home, &name);
    let mut settings = if path.exists() {
        let data = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&data)? {
            Value::Object(map) => map,
            _ => {
                return Err(ColabError::Malformed {
                    file: path.display().to_string(),
                    reason: "expected a JSON object".to_string(),
                })
            }
        }
    } else {
        Map::new()
    };

    merge_settings(&mut settings, patch);
    io::write_json(&path, &settings)?;
    Ok(settings)
}

pub fn set_bot_todos(
    home: &Path,
    name: &str,
    todos: Vec<Value>,
    manager: Option<&str>,
) -> Result<Map<String, Value>> {
    let mut patch = Map::new();
    patch.insert("startup_todos".to_string(), Value::Array(todos));
    set_bot_settings(home, name, &patch, manager)
}

/// Append `rule` to the bot's `rules` list unless it is already there.
pub fn add_bot_rule(
    home: &Path,
    name: &str,
    rule: &str,
    manager: Option<&str>,
) -> Result<Map<String, Value>> {
    let mut rules: Vec<Value> = get_bot_settings(home, name)
        .and_then(|s| s.get("rules").and_then(Value::as_array).cloned())
        .unwrap_or_default();
    if !rules.iter().any(|r| r.as_str() == Some(rule)) {
        rules.push(Value::String(rule.to_string()));
    }
    let mut patch = Map::new();
    patch.insert("rules".to_string(), Value::Array(rules));
    set_bot_settings(home, name, &patch, manager)
}

fn merge_settings(existing: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match (existing.get_mut(key), value) {
            (Some(Value::Object(old)), Value::Object(new)) => {
                for (k, v) in new {
                    old.insert(k.clone(), v.clone());
                }
            }
            _ => {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
