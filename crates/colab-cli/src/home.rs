use anyhow::Context;
use colab_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the install location.
///
/// Priority:
/// 1. `--home` flag / `COLAB_HOME` env var (passed in as `explicit`)
/// 2. The per-OS default (`C:\CLAUDE`, or `~/claude`)
///
/// Relative paths are anchored to the current directory so that paths written
/// into generated files stay valid from anywhere.
pub fn resolve_home(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    let home = match explicit {
        Some(p) => p.to_path_buf(),
        None => paths::default_home().context("cannot pick a default install location")?,
    };
    absolute(&home)
}

pub fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    Ok(cwd.join(path))
}
