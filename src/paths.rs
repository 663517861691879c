//! Centralized path resolution for ninja-provision
//!
//! # Environment Variables
//!
//! - `NINJA_PROVISION_CONFIG_DIR` - Override config directory
//! - `NINJA_PROVISION_STATE_DIR` - Override state directory (holds the tools)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `NINJA_PROVISION_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/ninja-provision` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\ninja-provision`
//!    - macOS/Linux: `~/.config/ninja-provision`
//!
//! For state_dir():
//! 1. `NINJA_PROVISION_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/ninja-provision` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\ninja-provision`
//!    - macOS/Linux: `~/.local/state/ninja-provision`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "ninja-provision";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "NINJA_PROVISION_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "NINJA_PROVISION_STATE_DIR";

/// Directory holding `config.toml` and `installations.toml`.
pub fn config_dir() -> Result<PathBuf> {
    app_dir("config", ENV_CONFIG_DIR, "XDG_CONFIG_HOME", dirs::config_dir, &[".config"])
}

/// Directory holding provisioned tools under `tools/`.
pub fn state_dir() -> Result<PathBuf> {
    app_dir(
        "state",
        ENV_STATE_DIR,
        "XDG_STATE_HOME",
        dirs::data_local_dir,
        &[".local", "state"],
    )
}

/// Resolve one of our directories: explicit override, then the XDG base,
/// then the Windows known folder, then a dot directory below home.
fn app_dir(
    kind: &str,
    override_var: &str,
    xdg_var: &str,
    windows_base: fn() -> Option<PathBuf>,
    home_relative: &[&str],
) -> Result<PathBuf> {
    let path = if let Ok(dir) = std::env::var(override_var) {
        log::debug!("{kind} dir overridden by {override_var}");
        expand(&dir)
    } else if let Ok(base) = std::env::var(xdg_var) {
        PathBuf::from(base).join(APP_DIR)
    } else if cfg!(windows)
        && let Some(base) = windows_base()
    {
        base.join(APP_DIR)
    } else {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        home_relative
            .iter()
            .fold(home, |path, segment| path.join(segment))
            .join(APP_DIR)
    };

    log::debug!("Using {kind} dir {}", path.display());
    Ok(path)
}

/// Path of `config.toml`
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Path of the installation registry
pub fn installations_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("installations.toml"))
}

/// Default root of provisioned tools
pub fn default_tools_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("tools"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
