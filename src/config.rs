//! Configuration for ripple-studio.
//!
//! Loaded from `~/.config/ripple-studio/config.toml` (`$XDG_CONFIG_HOME`
//! respected), written with defaults on first launch. CLI flags override
//! file values; see `main.rs`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channel: ChannelConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// WebSocket endpoint of the playback backend.
    pub endpoint: String,
    /// Seconds between reconnect attempts.
    pub reconnect_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Listen address for `ripple-studio backend`.
    pub listen: String,
    /// Fraction of play requests the admission policy rejects.
    pub reject_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:9310".to_string(),
            reconnect_secs: 3,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:9310".to_string(),
            reject_rate: 0.0,
        }
    }
}

/// Endpoint must be a ws:// or wss:// URL.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint)
        .with_context(|| format!("invalid endpoint URL: {endpoint}"))?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => anyhow::bail!("endpoint must use ws:// or wss://, got {other}://"),
    }
}

// ---------------------------------------------------------------------------
// Paths and file I/O
// ---------------------------------------------------------------------------

/// Return the config directory: `~/.config/ripple-studio/`.
///
/// Uses `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config/ripple-studio/`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("ripple-studio");
        return p;
    }
    let home = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    let mut p = home;
    p.push(".config");
    p.push("ripple-studio");
    p
}

pub fn config_path() -> PathBuf {
    let mut p = config_dir();
    p.push("config.toml");
    p
}

pub fn default_toml_content() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_default()
}

/// Write the default config if the file does not already exist. Creates
/// parent directories as needed.
pub fn ensure_default(path: &Path) {
    if path.exists() {
        return;
    }
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(target: "config", "failed to create config dir {}: {e}", parent.display());
            return;
        }
    }
    if let Err(e) = std::fs::write(path, default_toml_content()) {
        warn!(target: "config", "failed to write default config at {}: {e}", path.display());
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse config at {}", path.display()))
}

/// Load the config at `path`, falling back to defaults (with a warning) if
/// it is missing or malformed.
pub fn load_or_default(path: &Path) -> Config {
    match load(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(target: "config", "{e:#}; using defaults");
            Config::default()
        }
    }
}
