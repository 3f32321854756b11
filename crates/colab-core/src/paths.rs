use crate::error::{ColabError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

pub const KEYSTORE_FILE: &str = "keystore.json";
pub const VAULT_DIR: &str = "vault";
pub const NOTES_DIR: &str = "vault/notes";
pub const SHARED_DIR: &str = "shared";
pub const SERVICE_CONFIG_FILE: &str = "shared/service.json";

pub const VAULT_START_HERE: &str = "START HERE.md";
pub const VAULT_ABOUT_ME: &str = "About Me.md";

pub const BOT_CONFIG_FILE: &str = "config.json";
pub const BOT_SETTINGS_FILE: &str = "settings.json";
pub const ACTIVE_WORK_FILE: &str = "ACTIVE_WORK.md";
pub const STARTUP_SH_FILE: &str = "startup.sh";
pub const STARTUP_BAT_FILE: &str = "startup.bat";
pub const SOP_FILE: &str = "SOP.md";

pub const DEFAULT_WINDOWS_HOME: &str = r"C:\CLAUDE";
pub const DEFAULT_UNIX_HOME_DIR: &str = "claude";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Default install location: `C:\CLAUDE` on Windows, `~/claude` elsewhere.
pub fn default_home() -> Result<PathBuf> {
    if cfg!(windows) {
        return Ok(PathBuf::from(DEFAULT_WINDOWS_HOME));
    }
    home::home_dir()
        .map(|h| h.join(DEFAULT_UNIX_HOME_DIR))
        .ok_or(ColabError::HomeNotFound)
}

pub fn keystore_path(home: &Path) -> PathBuf {
    home.join(KEYSTORE_FILE)
}

pub fn vault_dir(home: &Path) -> PathBuf {
    home.join(VAULT_DIR)
}

pub fn notes_dir(home: &Path) -> PathBuf {
    home.join(NOTES_DIR)
}

pub fn shared_dir(home: &Path) -> PathBuf {
    home.join(SHARED_DIR)
}

pub fn service_config_path(home: &Path) -> PathBuf {
    home.join(SERVICE_CONFIG_FILE)
}

pub fn bot_dir(home: &Path, name: &str) -> PathBuf {
    home.join(name)
}

pub fn bot_config_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(BOT_CONFIG_FILE)
}

pub fn bot_settings_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(BOT_SETTINGS_FILE)
}

pub fn active_work_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(ACTIVE_WORK_FILE)
}

pub fn startup_sh_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(STARTUP_SH_FILE)
}

pub fn startup_bat_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(STARTUP_BAT_FILE)
}

pub fn sop_path(home: &Path, name: &str) -> PathBuf {
    bot_dir(home, name).join(SOP_FILE)
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

static BOT_NAME_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn bot_name_re() -> &'static Regex {
    BOT_NAME_RE.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9_\-]{0,63}$").unwrap())
}

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Canonical form of a bot name: trimmed, upper-cased, spaces become `_`.
pub fn normalize_bot_name(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

pub fn validate_bot_name(name: &str) -> Result<()> {
    if !bot_name_re().is_match(name) {
        return Err(ColabError::InvalidBotName(name.to_string()));
    }
    Ok(())
}

/// Normalize then validate; the returned name is safe to use as a directory.
pub fn bot_name(raw: &str) -> Result<String> {
    let name = normalize_bot_name(raw);
    validate_bot_name(&name)?;
    Ok(name)
}

pub fn validate_project_slug(slug: &str) -> Result<()> {
    if slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(ColabError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bot_names() {
        assert_eq!(normalize_bot_name("worker one"), "WORKER_ONE");
        assert_eq!(normalize_bot_name("  black "), "BLACK");
        assert_eq!(normalize_bot_name("Bot-2"), "BOT-2");
    }

    #[test]
    fn rejects_unsafe_bot_names() {
        for raw in ["", "   ", "../etc", "a/b", "_LEADING", "BOT.1"] {
            assert!(bot_name(raw).is_err(), "expected invalid: {raw:?}");
        }
        assert_eq!(bot_name("intolerant").unwrap(), "INTOLERANT");
    }

    #[test]
    fn project_slugs() {
        for slug in ["claude-colab", "medieval-game", "x1"] {
            validate_project_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
        for slug in ["", "-x", "x-", "Upper", "has space"] {
            assert!(validate_project_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn bot_paths() {
        let home = Path::new("/tmp/claude");
        assert_eq!(
            bot_config_path(home, "BOT1"),
            PathBuf::from("/tmp/claude/BOT1/config.json")
        );
        assert_eq!(
            startup_sh_path(home, "BOT1"),
            PathBuf::from("/tmp/claude/BOT1/startup.sh")
        );
        assert_eq!(
            service_config_path(home),
            PathBuf::from("/tmp/claude/shared/service.json")
        );
        assert_eq!(notes_dir(home), PathBuf::from("/tmp/claude/vault/notes"));
    }
}
