//! Configuration resolution for gpsdscan.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/gpsdscan/settings.json)
//! 3. Explicit config file (e.g. `--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Error, Result};

/// Complete gpsdscan configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Settings for the scanner's line buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Capacity of the read buffer wrapped around the source.
    pub read_buffer_bytes: usize,
    /// Largest record accepted, delimiter excluded.
    pub max_record_bytes: usize,
    /// Drop a `\r` that precedes the newline delimiter.
    pub strip_carriage_return: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: 8 * 1024,
            max_record_bytes: 64 * 1024,
            strip_carriage_return: true,
        }
    }
}

impl ScannerConfig {
    /// Check the settings a line buffer cannot work with.
    pub const fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.read_buffer_bytes == 0 {
            return Err(ConfigError::ZeroReadBuffer);
        }
        if self.max_record_bytes == 0 {
            return Err(ConfigError::ZeroRecordLimit);
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Emit structured JSON log lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            config = load_config_file(&global_path)?;
        }
    }

    // An explicit file must exist; a missing global file is fine.
    if let Some(path) = explicit {
        config = load_config_file(path)?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".gpsdscan").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/gpsdscan/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("gpsdscan").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Read one JSON settings file. Missing sections fall back to defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(n) = var("GPSDSCAN_MAX_RECORD_BYTES").and_then(|v| v.parse().ok()) {
        config.scanner.max_record_bytes = n;
    }
    if let Some(n) = var("GPSDSCAN_READ_BUFFER_BYTES").and_then(|v| v.parse().ok()) {
        config.scanner.read_buffer_bytes = n;
    }
    if let Some(val) = var("GPSDSCAN_LOG_LEVEL") {
        config.log.level = val;
    }
    if let Some(val) = var("GPSDSCAN_LOG_JSON") {
        config.log.json = matches!(val.as_str(), "1" | "true" | "yes");
    }
}
