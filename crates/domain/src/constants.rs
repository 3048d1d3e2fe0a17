//! Application constants
//!
//! Centralized location for the domain-level constants used by the client,
//! the session flow and the CLI.

// Backend origin
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("mani/", env!("CARGO_PKG_VERSION"));

// Auth flow
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh";
pub const DEFAULT_LOGIN_ROUTE: &str = "/admin/login";
pub const DEFAULT_EXPIRY_SKEW_SECS: i64 = 30;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "mani-church";
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "admin";

/// Retries allowed after a server-side 401 and a successful refresh.
pub const MAX_AUTH_RETRIES: usize = 1;

// Media upload
pub const MEDIA_FIELD_NAME: &str = "media";
pub const MAX_MEDIA_FILES: usize = 5;

// Logging
pub const DEFAULT_LOG_FILTER: &str = "mani=info,mani_lib=info,mani_infra=info,mani_common=info";
