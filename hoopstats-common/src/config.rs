//! Bootstrap configuration loading and setting resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "HOOPSTATS_CONFIG";

/// Directory name used under the platform config/data directories
const APP_DIR_NAME: &str = "hoopstats";

/// Bootstrap configuration loaded from TOML file
///
/// Every key is optional; unset keys fall through to environment variables
/// and compiled defaults during resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Rendered page host, e.g. `https://www.nba.com`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Structured stats API root, e.g. `https://stats.nba.com/stats`
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Directory holding cached records
    #[serde(default)]
    pub cache_directory: Option<PathBuf>,

    /// Minimum spacing between upstream requests in milliseconds
    #[serde(default)]
    pub pacing_delay_ms: Option<u64>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Season used for the player listing (e.g. "2024-25")
    #[serde(default)]
    pub season: Option<String>,

    /// Persist unmodified upstream payloads next to the cache
    #[serde(default)]
    pub persist_raw: Option<bool>,

    /// Extra request headers; replaces built-in headers with the same name
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the TOML config file.
///
/// Priority: command-line path, then `HOOPSTATS_CONFIG`, then the user config
/// directory (`<config_dir>/hoopstats/config.toml`) if that file exists.
/// Returns `None` when no candidate applies.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the bootstrap config, degrading to defaults when no file is present.
///
/// A missing file logs a warning and yields defaults. A file that exists but
/// does not parse is an error.
pub fn load_bootstrap_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        debug!("No config file found, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    debug!(path = %path.display(), "Loading config file");
    load_toml_config(&path)
}

/// Resolve a string setting: CLI > environment variable > TOML
///
/// Blank values are treated as unset at every level.
pub fn resolve_string(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg.filter(|v| !v.trim().is_empty()) {
        return Some(value.to_string());
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }

    toml_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Resolve the cache directory: CLI > environment variable > TOML > default
pub fn resolve_cache_directory(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_cache_directory()
}

/// OS-dependent default cache directory
///
/// `<data_local_dir>/hoopstats`, or `./nba_player_data` when the platform
/// has no data directory.
pub fn default_cache_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./nba_player_data"))
}
