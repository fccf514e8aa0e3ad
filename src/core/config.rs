use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::system_monitor::{DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE, MAX_PROBE_TIMEOUT};

const MIN_INTERVAL_MS: u64 = 100;
const MAX_INTERVAL_MS: u64 = 60 * 60 * 1000;
const MIN_PROBE_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time between ticks, between 100 ms and one hour
    pub interval_ms: u64,
    /// Sleep after a failed tick, as a multiple of the interval
    pub backoff_multiplier: u32,
    /// Per-probe limit for vendor tools, never above 5 seconds
    pub probe_timeout_ms: u64,
    /// Values kept per history chart, at most one hour's worth
    pub history_capacity: usize,
    /// Mount point reported as "the" disk. Defaults to the system root
    pub disk_mount: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            backoff_multiplier: 5,
            probe_timeout_ms: MAX_PROBE_TIMEOUT.as_millis() as u64,
            history_capacity: DEFAULT_HISTORY_SIZE,
            disk_mount: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from `path`; a missing, empty or unreadable-as-JSON file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }

        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt config file {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("sysdash").join("config.json"))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS))
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity.clamp(1, MAX_HISTORY_SIZE)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.max(MIN_PROBE_TIMEOUT_MS)).min(MAX_PROBE_TIMEOUT)
    }

    pub fn disk_mount(&self) -> PathBuf {
        match &self.disk_mount {
            Some(mount) => PathBuf::from(mount),
            None => default_disk_mount(),
        }
    }
}

#[cfg(windows)]
fn default_disk_mount() -> PathBuf {
    PathBuf::from("C:\\")
}

#[cfg(not(windows))]
fn default_disk_mount() -> PathBuf {
    PathBuf::from("/")
}
