//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_EXPIRY_SKEW_SECS,
    DEFAULT_KEYCHAIN_ACCOUNT, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_LOGIN_ROUTE, DEFAULT_LOG_FILTER,
    DEFAULT_REFRESH_PATH, DEFAULT_USER_AGENT,
};
use crate::impl_domain_enum_conversions;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend origin and transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Fixed origin every request path is resolved against
    pub base_url: String,
    /// Transport-level timeout; the request core itself has no timeout policy
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Credential lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the token refresh endpoint, relative to `api.base_url`
    pub refresh_path: String,
    /// Route the user is sent to after logout
    pub login_route: String,
    /// A credential expiring within this many seconds is treated as invalid
    pub expiry_skew_seconds: i64,
    /// Share one in-flight refresh between concurrent requests
    pub dedupe_refresh: bool,
    pub keychain_service: String,
    pub keychain_account: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            expiry_skew_seconds: DEFAULT_EXPIRY_SKEW_SECS,
            dedupe_refresh: false,
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            keychain_account: DEFAULT_KEYCHAIN_ACCOUNT.to_string(),
        }
    }
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl_domain_enum_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: DEFAULT_LOG_FILTER.to_string(), format: LogFormat::Pretty }
    }
}
