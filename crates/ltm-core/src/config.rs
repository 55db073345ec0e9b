//! User configuration, stored as TOML in the XDG config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Release-check settings (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Release API URLs, asked in order until one answers.
    #[serde(default)]
    pub endpoints: Vec<String>,
    #[serde(default = "default_update_timeout")]
    pub timeout_secs: u64,
}

fn default_update_timeout() -> u64 {
    10
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            timeout_secs: default_update_timeout(),
        }
    }
}

/// Global configuration loaded from `~/.config/ltm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtmConfig {
    /// Maximum number of downloads running at once.
    pub max_concurrent_downloads: usize,
    /// Upper bound on the dispatcher's idle wait when the pool is full.
    pub dispatch_poll_ms: u64,
    /// Pause before refreshing a listing the drive has just changed.
    pub settle_delay_ms: u64,
    /// Capacity of the event channel.
    pub event_capacity: usize,
    /// Default destination for downloads.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Directory served by the mirror drive.
    #[serde(default)]
    pub drive_root: Option<PathBuf>,
    #[serde(default)]
    pub update: Option<UpdateConfig>,
}

impl Default for LtmConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 3,
            dispatch_poll_ms: 1000,
            settle_delay_ms: 1500,
            event_capacity: 256,
            download_dir: None,
            drive_root: None,
            update: None,
        }
    }
}

impl LtmConfig {
    pub fn dispatch_poll(&self) -> Duration {
        Duration::from_millis(self.dispatch_poll_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ltm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LtmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LtmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let cfg: LtmConfig =
        toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}
