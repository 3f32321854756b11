use crate::bot::Role;
use crate::error::{ColabError, Result};
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_SERVICE_URL: &str = "COLAB_URL";
pub const ENV_ANON_KEY: &str = "COLAB_ANON_KEY";
const LEGACY_ENV_SERVICE_URL: &str = "SUPABASE_URL";
const LEGACY_ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Project used when a bot has not picked one.
pub const DEFAULT_PROJECT: &str = "claude-colab";

// ---------------------------------------------------------------------------
// BotSettingsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSettingsConfig {
    /// Seconds between heartbeats in `colab run`.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
    #[serde(default = "default_check_mentions")]
    pub check_mentions: bool,
    #[serde(default)]
    pub auto_claim_tasks: bool,
}

fn default_heartbeat_interval() -> u64 {
    60
}

fn default_check_mentions() -> bool {
    true
}

impl Default for BotSettingsConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: default_heartbeat_interval(),
            check_mentions: default_check_mentions(),
            auto_claim_tasks: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

/// Per-bot `config.json`, written by the installer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Where the key lives, e.g. `keystore:BOT1`. The key itself is never stored here.
    pub api_key_ref: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub settings: BotSettingsConfig,
}

impl BotConfig {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        let name = name.into();
        Self {
            api_key_ref: format!("keystore:{name}"),
            name,
            project: None,
            role,
            created: Some(chrono::Utc::now().to_rfc3339()),
            settings: BotSettingsConfig::default(),
        }
    }

    pub fn exists(home: &Path, name: &str) -> bool {
        paths::bot_config_path(home, name).exists()
    }

    pub fn load(home: &Path, name: &str) -> Result<Self> {
        let path = paths::bot_config_path(home, name);
        if !path.exists() {
            return Err(ColabError::BotNotFound(name.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|e| ColabError::Malformed {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        io::write_json(&paths::bot_config_path(home, &self.name), self)
    }

    /// Bot name the key reference points at (`keystore:NAME` → `NAME`).
    pub fn keystore_name(&self) -> &str {
        self.api_key_ref
            .strip_prefix("keystore:")
            .unwrap_or(&self.name)
    }

    pub fn project_or_default(&self) -> &str {
        self.project.as_deref().unwrap_or(DEFAULT_PROJECT)
    }
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Where the hosted service lives and the public key sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
    pub anon_key: String,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Resolve from the process environment, then `<home>/shared/service.json`.
    pub fn resolve(home: &Path) -> Result<Self> {
        Self::resolve_with(home, |var| std::env::var(var).ok())
    }

    pub fn resolve_with(home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(cfg) = Self::from_env_with(&lookup) {
            return Ok(cfg);
        }
        let path = paths::service_config_path(home);
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let cfg: ServiceConfig =
                serde_json::from_str(&data).map_err(|e| ColabError::Malformed {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            return Ok(Self::new(cfg.url, cfg.anon_key));
        }
        Err(ColabError::ServiceNotConfigured(path.display().to_string()))
    }

    /// Both the URL and the anon key must be present; legacy names are accepted.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let url = non_empty(ENV_SERVICE_URL).or_else(|| non_empty(LEGACY_ENV_SERVICE_URL))?;
        let anon_key = non_empty(ENV_ANON_KEY).or_else(|| non_empty(LEGACY_ENV_ANON_KEY))?;
        Some(Self::new(url, anon_key))
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        io::write_json(&paths::service_config_path(home), self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn new_bot_config_matches_installer_defaults() {
        let cfg = BotConfig::new("BOT1", Role::Worker);
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["name"], "BOT1");
        assert_eq!(json["api_key_ref"], "keystore:BOT1");
        assert!(json["project"].is_null());
        assert_eq!(json["role"], "worker");
        assert_eq!(json["settings"]["heartbeat_interval"], 60);
        assert_eq!(json["settings"]["check_mentions"], true);
        assert_eq!(json["settings"]["auto_claim_tasks"], false);
    }

    #[test]
    fn bot_config_save_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = BotConfig::new("WORKER1", Role::Grunt);
        cfg.project = Some("medieval-game".to_string());
        cfg.save(dir.path()).unwrap();

        let loaded = BotConfig::load(dir.path(), "WORKER1").unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.project_or_default(), "medieval-game");
        assert_eq!(loaded.keystore_name(), "WORKER1");
    }

    #[test]
    fn missing_bot_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            BotConfig::load(dir.path(), "GHOST"),
            Err(ColabError::BotNotFound(_))
        ));
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = TempDir::new().unwrap();
        let path = paths::bot_config_path(dir.path(), "OLD");
        io::atomic_write(
            &path,
            br#"{"name": "OLD", "api_key_ref": "keystore:OLD", "created": "1712345678.0"}"#,
        )
        .unwrap();
        let cfg = BotConfig::load(dir.path(), "OLD").unwrap();
        assert_eq!(cfg.role, Role::Bot);
        assert_eq!(cfg.settings, BotSettingsConfig::default());
        assert_eq!(cfg.project_or_default(), DEFAULT_PROJECT);
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn service_config_prefers_environment() {
        let dir = TempDir::new().unwrap();
        ServiceConfig::new("https://file.example", "file-anon")
            .save(dir.path())
            .unwrap();
        let cfg = ServiceConfig::resolve_with(
            dir.path(),
            env(&[(ENV_SERVICE_URL, "https://env.example/"), (ENV_ANON_KEY, "env-anon")]),
        )
        .unwrap();
        assert_eq!(cfg.url, "https://env.example");
        assert_eq!(cfg.anon_key, "env-anon");
    }

    #[test]
    fn service_config_accepts_legacy_names() {
        let cfg = ServiceConfig::from_env_with(env(&[
            ("SUPABASE_URL", "https://legacy.example"),
            ("SUPABASE_ANON_KEY", "legacy-anon"),
        ]))
        .unwrap();
        assert_eq!(cfg.url, "https://legacy.example");
    }

    #[test]
    fn service_config_falls_back_to_file() {
        let dir = TempDir::new().unwrap();
        ServiceConfig::new("https://file.example", "file-anon")
            .save(dir.path())
            .unwrap();
        let cfg =
            ServiceConfig::resolve_with(dir.path(), env(&[(ENV_SERVICE_URL, "https://x")]))
                .unwrap();
        assert_eq!(cfg.url, "https://file.example");
    }

    #[test]
    fn service_config_missing_everywhere() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            ServiceConfig::resolve_with(dir.path(), env(&[])),
            Err(ColabError::ServiceNotConfigured(_))
        ));
    }
}
