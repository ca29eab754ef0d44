//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.relic/config.json`) and
//! environment. The forwarder destination is the only mandatory value and is
//! validated at startup, not here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Liveness HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Forwarder destination and delivery mode.
    #[serde(default)]
    pub forwarder: ForwarderConfig,

    /// Bridge sidecar settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Optional external uptime heartbeat.
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Cloud-storage upload settings (mode "drive" only).
    #[serde(default)]
    pub drive: DriveConfig,
}

/// Bind and port for the liveness endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the HTTP liveness endpoints (default 15252).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    15252
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// How a downloaded payload leaves the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Forward to the fixed destination JID via the bridge's send primitive.
    #[default]
    Send,

    /// Upload to cloud storage and log the shareable link.
    Drive,
}

/// Forwarder settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwarderConfig {
    /// Destination JID (phone-number-like string). Mandatory for mode "send";
    /// missing destination is a fatal startup error. Overridden by
    /// RELIC_DESTINATION env when set.
    pub destination: Option<String>,

    /// Delivery mode (default "send").
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// Bridge sidecar connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Base URL of the bridge sidecar HTTP API (default "http://127.0.0.1:3030").
    /// Overridden by RELIC_BRIDGE_URL env when set.
    #[serde(default = "default_bridge_url")]
    pub base_url: String,

    /// Optional bearer token sent on every bridge request.
    pub api_token: Option<String>,

    /// Session credential directory, maintained entirely by the bridge. The
    /// core never reads or writes it; `relic init` only creates it.
    pub session_dir: Option<PathBuf>,
}

fn default_bridge_url() -> String {
    "http://127.0.0.1:3030".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            api_token: None,
            session_dir: None,
        }
    }
}

/// External uptime heartbeat (e.g. a cron-monitor ping URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatConfig {
    /// When set, the URL is fetched periodically; independent of message handling.
    pub url: Option<String>,

    /// Ping interval in seconds (default 300).
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
}

fn default_heartbeat_interval() -> u64 {
    300
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_heartbeat_interval(),
        }
    }
}

/// Cloud-storage upload settings. The access token is a static bearer
/// credential; refreshing it is the deployment's concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveConfig {
    /// Bearer token for the upload API. Overridden by RELIC_DRIVE_TOKEN env.
    pub access_token: Option<String>,

    /// Parent folder id for uploaded files.
    pub folder_id: Option<String>,
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the forward destination: env RELIC_DESTINATION overrides config.
pub fn resolve_destination(config: &Config) -> Option<String> {
    env_nonempty("RELIC_DESTINATION").or_else(|| {
        config
            .forwarder
            .destination
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the bridge base URL: env RELIC_BRIDGE_URL overrides config.
pub fn resolve_bridge_url(config: &Config) -> String {
    env_nonempty("RELIC_BRIDGE_URL").unwrap_or_else(|| config.bridge.base_url.trim().to_string())
}

/// Resolve the drive access token: env RELIC_DRIVE_TOKEN overrides config.
pub fn resolve_drive_token(config: &Config) -> Option<String> {
    env_nonempty("RELIC_DRIVE_TOKEN").or_else(|| {
        config
            .drive
            .access_token
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELIC_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".relic").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Resolve the bridge session directory: `config.bridge.sessionDir` when set,
/// otherwise the `session` subdirectory next to the config file.
pub fn resolve_session_dir(config: &Config, config_path: &std::path::Path) -> PathBuf {
    match &config.bridge.session_dir {
        Some(d) if !d.as_os_str().is_empty() => d.clone(),
        _ => config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("session"),
    }
}

/// Load config from the default path (or RELIC_CONFIG_PATH). Missing file =>
/// default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 15252);
        assert_eq!(s.bind, "127.0.0.1");
    }

    #[test]
    fn default_mode_is_send() {
        let f = ForwarderConfig::default();
        assert_eq!(f.mode, DeliveryMode::Send);
        assert_eq!(f.destination, None);
    }

    #[test]
    fn mode_parses_lowercase() {
        let config: Config =
            serde_json::from_str(r#"{ "forwarder": { "mode": "drive" } }"#).expect("parse");
        assert_eq!(config.forwarder.mode, DeliveryMode::Drive);
    }

    #[test]
    fn destination_trimmed_and_empty_filtered() {
        let mut config = Config::default();
        config.forwarder.destination = Some("  15551230000@c.us  ".to_string());
        assert_eq!(
            resolve_destination(&config).as_deref(),
            Some("15551230000@c.us")
        );
        config.forwarder.destination = Some("   ".to_string());
        assert_eq!(resolve_destination(&config), None);
    }

    #[test]
    fn resolve_session_dir_default() {
        let config = Config::default();
        let path = Path::new("/home/user/.relic/config.json");
        assert_eq!(
            resolve_session_dir(&config, path),
            PathBuf::from("/home/user/.relic/session")
        );
    }

    #[test]
    fn resolve_session_dir_override() {
        let mut config = Config::default();
        config.bridge.session_dir = Some(PathBuf::from("/data/wa-session"));
        let path = Path::new("/home/user/.relic/config.json");
        assert_eq!(
            resolve_session_dir(&config, path),
            PathBuf::from("/data/wa-session")
        );
    }
}
