//! Initialize the configuration directory: create ~/.relic, a default config,
//! and the bridge session directory.
//!
//! The session directory holds opaque credentials maintained entirely by the
//! bridge process; the core only ensures it exists.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

/// Ensure the configuration directory has been initialized (config file and
/// session directory exist).
pub fn require_initialized(config_path: &Path, config: &config::Config) -> Result<()> {
    if !config_path.exists() {
        anyhow::bail!(
            "configuration not initialized; run `relic init` first (config file not found: {})",
            config_path.display()
        );
    }
    let session_dir = config::resolve_session_dir(config, config_path);
    if !session_dir.exists() {
        anyhow::bail!(
            "configuration not initialized; run `relic init` first (session directory not found: {})",
            session_dir.display()
        );
    }
    Ok(())
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Creates the `session` subdirectory for the bridge's credentials.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = b"{}";
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let session_dir = config_dir.join("session");
    if !session_dir.exists() {
        std::fs::create_dir_all(&session_dir)
            .with_context(|| format!("creating session directory {}", session_dir.display()))?;
        log::info!("created session directory at {}", session_dir.display());
    } else {
        log::debug!(
            "session directory already exists at {}, skipping",
            session_dir.display()
        );
    }

    Ok(config_dir.to_path_buf())
}
