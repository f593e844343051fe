//! TOML-based configuration persistence for the scan station.
//!
//! Reads and writes [`StationConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\ScanStation\config.toml`
//! - Linux:    `~/.config/scanstation/config.toml`
//! - macOS:    `~/Library/Application Support/ScanStation/config.toml`
//!
//! ```toml
//! [station]
//! log_level = "info"
//!
//! [scanner]
//! enabled = true
//! inter_key_threshold_ms = 80
//! minimum_scan_length = 3
//!
//! [serial]
//! enabled = false
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! idle_flush_ms = 150
//! ```
//!
//! # Serde default values
//!
//! Every field carries a `#[serde(default = ...)]`, so an empty file, a
//! missing section, or a config written by an older build all load cleanly.

use std::path::{Path, PathBuf};

use scan_core::{DetectorConfig, SerialFramingConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] scan_core::ConfigError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level station configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StationConfig {
    #[serde(default)]
    pub station: StationSettings,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub serial: SerialConfig,
}

/// General station behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationSettings {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Keyboard-wedge scan detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScannerConfig {
    /// Whether the terminal keyboard is watched for scans.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Largest gap between keys of one scan, in milliseconds.
    #[serde(default = "default_inter_key_threshold_ms")]
    pub inter_key_threshold_ms: u64,
    /// Shortest trimmed buffer reported as a scan.
    #[serde(default = "default_minimum_scan_length")]
    pub minimum_scan_length: usize,
}

/// Serial (virtual COM port) scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Quiet period that ends a serial scan, in milliseconds.
    #[serde(default = "default_serial_idle_flush_ms")]
    pub idle_flush_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_inter_key_threshold_ms() -> u64 {
    scan_core::domain::config::DEFAULT_INTER_KEY_THRESHOLD_MS
}
fn default_minimum_scan_length() -> usize {
    scan_core::domain::config::DEFAULT_MINIMUM_SCAN_LENGTH
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_serial_idle_flush_ms() -> u64 {
    scan_core::domain::config::DEFAULT_SERIAL_IDLE_FLUSH_MS
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            inter_key_threshold_ms: default_inter_key_threshold_ms(),
            minimum_scan_length: default_minimum_scan_length(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: None,
            baud_rate: default_baud_rate(),
            idle_flush_ms: default_serial_idle_flush_ms(),
        }
    }
}

impl StationConfig {
    /// The keyboard detector configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Invalid`] for a zero threshold or length.
    pub fn detector_config(&self) -> Result<DetectorConfig, StorageError> {
        Ok(DetectorConfig::new(
            self.scanner.inter_key_threshold_ms,
            self.scanner.minimum_scan_length,
        )?)
    }

    /// The serial framing configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Invalid`] for a zero quiet period.
    pub fn framing_config(&self) -> Result<SerialFramingConfig, StorageError> {
        Ok(SerialFramingConfig::new(self.serial.idle_flush_ms)?)
    }

    /// Checks every numeric setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError::Invalid`] found.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.detector_config()?;
        self.framing_config()?;
        Ok(())
    }

    /// The serial port to open, if the serial scanner is enabled and a port is set.
    pub fn serial_port(&self) -> Option<&str> {
        if self.serial.enabled {
            self.serial.port.as_deref()
        } else {
            None
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`StorageError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, StorageError> {
    platform_config_dir().ok_or(StorageError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`StorageError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, StorageError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<StationConfig, StorageError> {
    load_config_from(&config_file_path()?)
}

/// Loads `StationConfig` from `path`, returning `StationConfig::default()` if
/// the file does not yet exist.
///
/// # Errors
///
/// Returns [`StorageError::Io`] for file-system errors other than "not found",
/// and [`StorageError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<StationConfig, StorageError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: StationConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StationConfig::default()),
        Err(e) => Err(StorageError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the default location.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &StationConfig) -> Result<(), StorageError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`StorageError::Io`] for file-system failures or
/// [`StorageError::Serialize`] if serialization fails.
pub fn save_config_to(config: &StationConfig, path: &Path) -> Result<(), StorageError> {
    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the `ScanStation` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("ScanStation"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("scanstation"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("ScanStation"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
