//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `MANI_API_BASE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MANI_API_BASE_URL`: Backend origin (required for env loading)
//! - `MANI_API_TIMEOUT`: Transport timeout in seconds
//! - `MANI_AUTH_REFRESH_PATH`: Path of the refresh endpoint
//! - `MANI_AUTH_LOGIN_ROUTE`: Route the user is sent to on logout
//! - `MANI_AUTH_EXPIRY_SKEW`: Seconds before expiry a token counts as invalid
//! - `MANI_AUTH_DEDUPE_REFRESH`: Share one in-flight refresh (true/false)
//! - `MANI_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./mani.json` or `./mani.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use mani_domain::{Config, LogFormat, ManiError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to a config file, and finally to defaults.
///
/// # Errors
/// Returns `ManiError::Config` if:
/// - An environment variable or file has an invalid value
/// - File format is invalid
/// - The base URL is not an http(s) origin
pub fn load() -> Result<Config> {
    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) if std::env::var("MANI_API_BASE_URL").is_ok() => return Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
        }
    }

    if probe_config_paths().is_some() {
        return load_from_file(None);
    }

    tracing::info!("No configuration found, using defaults");
    normalize(Config::default())
}

/// Load configuration from environment variables
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `ManiError::Config` if `MANI_API_BASE_URL` is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("MANI_API_BASE_URL")?;
    if let Some(timeout) = env_parse::<u64>("MANI_API_TIMEOUT", "timeout")? {
        config.api.timeout_seconds = timeout;
    }

    if let Ok(path) = std::env::var("MANI_AUTH_REFRESH_PATH") {
        config.auth.refresh_path = path;
    }
    if let Ok(route) = std::env::var("MANI_AUTH_LOGIN_ROUTE") {
        config.auth.login_route = route;
    }
    if let Some(skew) = env_parse::<i64>("MANI_AUTH_EXPIRY_SKEW", "expiry skew")? {
        config.auth.expiry_skew_seconds = skew;
    }
    config.auth.dedupe_refresh = env_bool("MANI_AUTH_DEDUPE_REFRESH", false);

    if let Ok(format) = std::env::var("MANI_LOG_FORMAT") {
        config.logging.format = LogFormat::from_str(&format).map_err(ManiError::Config)?;
    }

    normalize(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `ManiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ManiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ManiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ManiError::Config(format!("Failed to read config file: {}", e)))?;

    normalize(parse_config(&contents, &config_path)?)
}

/// Validate the configuration and bring paths into canonical form
///
/// - trailing `/` is trimmed from the base URL
/// - the refresh path and login route gain a leading `/`
///
/// # Errors
/// Returns `ManiError::Config` if the base URL is not an http(s) origin or
/// the timeout is zero.
pub fn normalize(mut config: Config) -> Result<Config> {
    let base_url = config.api.base_url.trim().trim_end_matches('/').to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ManiError::Config(format!(
            "API base URL must start with http:// or https://, got '{}'",
            config.api.base_url
        )));
    }
    config.api.base_url = base_url;

    if config.api.timeout_seconds == 0 {
        return Err(ManiError::Config("API timeout must be greater than zero".to_string()));
    }

    config.auth.refresh_path = leading_slash(&config.auth.refresh_path);
    config.auth.login_route = leading_slash(&config.auth.login_route);

    Ok(config)
}

fn leading_slash(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ManiError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ManiError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ManiError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ManiError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./mani.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("mani.json"),
        dir.join("mani.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `ManiError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ManiError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str, label: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ManiError::Config(format!("Invalid {}: {}", label, e))),
        Err(_) => Ok(None),
    }
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
