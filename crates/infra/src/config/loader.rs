//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `FEATUREGATE_DB_PATH` is unset, falls back to a config file
//! 3. Probes the working directory and the executable's directory
//! 4. Supports JSON and TOML formats
//! 5. With no file anywhere, uses the built-in defaults
//!
//! ## Environment Variables
//! - `FEATUREGATE_DB_PATH`: Database file path (required for env loading)
//! - `FEATUREGATE_DB_POOL_SIZE`: Connection pool size
//! - `FEATUREGATE_LOG_LEVEL`: Default log filter directive
//! - `FEATUREGATE_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes, in order, `featuregate.toml`, `featuregate.json`,
//! `config.toml` and `config.json`, first in the current working directory
//! and then next to the executable.

use std::path::{Path, PathBuf};

use featuregate_domain::constants::{DEFAULT_DB_POOL_SIZE, DEFAULT_LOG_LEVEL};
use featuregate_domain::{Config, DatabaseConfig, FeatureGateError, LoggingConfig, Result};

pub const ENV_DB_PATH: &str = "FEATUREGATE_DB_PATH";
pub const ENV_DB_POOL_SIZE: &str = "FEATUREGATE_DB_POOL_SIZE";
pub const ENV_LOG_LEVEL: &str = "FEATUREGATE_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "FEATUREGATE_LOG_JSON";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["featuregate.toml", "featuregate.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// Environment first, then the first probed config file, then defaults.
///
/// # Errors
/// Returns `FeatureGateError::Config` if an environment value is malformed
/// or a probed file cannot be read or parsed.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `FEATUREGATE_DB_PATH` must be present; the other variables fall back to
/// their defaults.
///
/// # Errors
/// Returns `FeatureGateError::Config` if the path is missing or the pool size
/// is not a number.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var(ENV_DB_PATH)?;
    let db_pool_size = match std::env::var(ENV_DB_POOL_SIZE) {
        Ok(s) => s
            .parse::<u32>()
            .map_err(|e| FeatureGateError::Config(format!("Invalid pool size: {e}")))?,
        Err(_) => DEFAULT_DB_POOL_SIZE,
    };
    let log_level =
        std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let log_json = env_bool(ENV_LOG_JSON, false);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        logging: LoggingConfig { level: log_level, json: log_json },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Format is detected by file extension.
///
/// # Errors
/// Returns `FeatureGateError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FeatureGateError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FeatureGateError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FeatureGateError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FeatureGateError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FeatureGateError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FeatureGateError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    first_existing(&dirs)
}

fn first_existing(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `FeatureGateError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FeatureGateError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
