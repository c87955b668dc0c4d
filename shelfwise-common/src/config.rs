//! Configuration loading and root folder resolution
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--root`, `--state-dir`)
//! 2. Environment variables (`SHELFWISE_ROOT`, `SHELFWISE_STATE_DIR`)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! Missing or unreadable TOML files never abort startup: a warning is logged
//! and built-in defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_ENV_VAR: &str = "SHELFWISE_ROOT";

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV_VAR: &str = "SHELFWISE_STATE_DIR";

/// Name of the state directory created under the root folder by default
pub const DEFAULT_STATE_DIR_NAME: &str = ".shelfwise";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Root folder anchoring all relative media paths
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Directory holding the persisted learning/preference documents
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults applied to suggestion requests that omit them
    #[serde(default)]
    pub suggestions: SuggestionDefaults,

    /// Learned-pattern retention
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Suggestion request defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionDefaults {
    /// Candidates below this confidence are dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Maximum number of suggestions returned per request
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

impl Default for SuggestionDefaults {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            max_count: default_max_count(),
        }
    }
}

/// Retention of stale learned patterns
///
/// A pattern idle for more than `max_idle_days` that was observed fewer than
/// `min_frequency` times is dropped when pruning runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionConfig {
    /// Prune automatically when state is loaded
    #[serde(default = "default_retention_enabled")]
    pub enabled: bool,

    #[serde(default = "default_max_idle_days")]
    pub max_idle_days: i64,

    #[serde(default = "default_min_frequency")]
    pub min_frequency: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_retention_enabled(),
            max_idle_days: default_max_idle_days(),
            min_frequency: default_min_frequency(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_max_count() -> usize {
    20
}

fn default_retention_enabled() -> bool {
    true
}

fn default_max_idle_days() -> i64 {
    180
}

fn default_min_frequency() -> u32 {
    2
}

/// Default configuration file path for the platform
///
/// `~/.config/shelfwise/config.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shelfwise").join("config.toml"))
}

/// Load TOML configuration, degrading to defaults
///
/// A missing file is normal (first run) and logged at `info`. A file that
/// exists but cannot be read or parsed is logged at `warn`. Neither aborts.
pub fn load_toml_config(path: &Path) -> TomlConfig {
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return TomlConfig::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
            TomlConfig::default()
        }
    }
}

/// Read and parse a TOML configuration file, propagating errors
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    crate::fs::write_atomic(path, content.as_bytes())
}

/// Root folder resolution
///
/// Priority: CLI argument → `SHELFWISE_ROOT` → TOML `root_folder` → current directory.
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root folder given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Root folder from the TOML configuration
    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.toml_value = config.root_folder.clone();
        self
    }

    /// Resolve the root folder (never fails)
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        PathBuf::from(".")
    }
}

/// Resolve the state directory for a given root folder
///
/// Priority: explicit argument → `SHELFWISE_STATE_DIR` → TOML `state_dir` →
/// `<root>/.shelfwise`.
pub fn resolve_state_dir(
    cli_arg: Option<&Path>,
    config: &TomlConfig,
    root_folder: &Path,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(STATE_DIR_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.state_dir {
        return path.clone();
    }

    root_folder.join(DEFAULT_STATE_DIR_NAME)
}

/// Validate configuration values that serde cannot check
pub fn validate(config: &TomlConfig) -> Result<()> {
    let min = config.suggestions.min_confidence;
    if !(0.0..=1.0).contains(&min) {
        return Err(Error::Config(format!(
            "suggestions.min_confidence must be within 0.0-1.0, got {}",
            min
        )));
    }
    if config.retention.max_idle_days < 0 {
        return Err(Error::Config(format!(
            "retention.max_idle_days must not be negative, got {}",
            config.retention.max_idle_days
        )));
    }
    Ok(())
}
