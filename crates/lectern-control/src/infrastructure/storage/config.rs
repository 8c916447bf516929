//! TOML-based configuration persistence for the control surface.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Lectern\config.toml`
//! - Linux:    `~/.config/lectern/config.toml`
//! - macOS:    `~/Library/Application Support/Lectern/config.toml`
//!
//! Example:
//!
//! ```toml
//! [control]
//! log_level = "debug"
//!
//! [sync]
//! max_drift_secs = 1.5
//! report_interval_ms = 250
//!
//! [surface]
//! bridge_port = 24900
//!
//! [[surface.displays]]
//! display_id = 0
//! width = 1920
//! height = 1080
//! is_primary = true
//! ```
//!
//! # Serde default values
//!
//! Every field has a `#[serde(default = ...)]`, so a missing file, a missing
//! section, or a file from an older version all load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lectern_core::drift::{DriftPolicy, DRIFT_RATE_THRESHOLD, MAX_DRIFT_THRESHOLD, RATE_NUDGE};

use crate::application::surface_lifecycle::DisplayInfo;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
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
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
}

/// General control surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
    /// Schema version string – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Playback synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    #[serde(default = "default_max_drift")]
    pub max_drift_secs: f64,
    #[serde(default = "default_rate_threshold")]
    pub rate_threshold_secs: f64,
    #[serde(default = "default_rate_nudge")]
    pub rate_nudge: f64,
    /// Minimum spacing between periodic position reports.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

/// Output surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurfaceConfig {
    /// Address the surface bridge listens on.  Loopback by default; the
    /// output surface always runs on the same machine.
    #[serde(default = "default_bridge_address")]
    pub bridge_address: String,
    #[serde(default = "default_bridge_port")]
    pub bridge_port: u16,
    /// Path of the output surface executable.  When absent, the binary next
    /// to the running control executable is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_binary: Option<PathBuf>,
    /// Known displays.  An empty list means a single primary display.
    #[serde(default)]
    pub displays: Vec<DisplayEntry>,
}

/// One display as described in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayEntry {
    pub display_id: u32,
    #[serde(default)]
    pub x_offset: i32,
    #[serde(default)]
    pub y_offset: i32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: u32,
    #[serde(default)]
    pub is_primary: bool,
}

/// Media resource settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourcesConfig {
    /// Directory the resource server may serve from.
    #[serde(default = "default_resource_root")]
    pub root: PathBuf,
    /// Port the resource server listens on.
    #[serde(default = "default_resource_port")]
    pub port: u16,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_drift() -> f64 {
    MAX_DRIFT_THRESHOLD
}
fn default_rate_threshold() -> f64 {
    DRIFT_RATE_THRESHOLD
}
fn default_rate_nudge() -> f64 {
    RATE_NUDGE
}
fn default_report_interval_ms() -> u64 {
    500
}
fn default_bridge_address() -> String {
    "127.0.0.1".to_string()
}
fn default_bridge_port() -> u16 {
    24900
}
fn default_scale_factor() -> u32 {
    100
}
fn default_resource_root() -> PathBuf {
    platform_config_dir()
        .map(|d| d.join("media"))
        .unwrap_or_else(|| PathBuf::from("media"))
}
fn default_resource_port() -> u16 {
    24901
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_drift_secs: default_max_drift(),
            rate_threshold_secs: default_rate_threshold(),
            rate_nudge: default_rate_nudge(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            bridge_address: default_bridge_address(),
            bridge_port: default_bridge_port(),
            output_binary: None,
            displays: Vec::new(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: default_resource_root(),
            port: default_resource_port(),
        }
    }
}

impl SyncConfig {
    /// The drift policy, or the defaults if the configured thresholds are
    /// inconsistent.
    pub fn drift_policy(&self) -> DriftPolicy {
        let policy = DriftPolicy {
            max_drift_secs: self.max_drift_secs,
            rate_threshold_secs: self.rate_threshold_secs,
            rate_nudge: self.rate_nudge,
        };
        if policy.is_valid() {
            policy
        } else {
            tracing::warn!(?policy, "invalid drift thresholds in config; using defaults");
            DriftPolicy::default()
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

impl From<&DisplayEntry> for DisplayInfo {
    fn from(e: &DisplayEntry) -> Self {
        DisplayInfo {
            display_id: e.display_id,
            x_offset: e.x_offset,
            y_offset: e.y_offset,
            width: e.width,
            height: e.height,
            scale_factor: e.scale_factor,
            is_primary: e.is_primary,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the `Lectern`
/// subdirectory.
pub fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Lectern"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("lectern"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Lectern")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
