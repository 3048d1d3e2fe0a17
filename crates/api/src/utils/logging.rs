use std::time::Duration;

use mani_domain::ManiError;
use mani_infra::api::{ApiError, ApiErrorCategory};
use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"request::get"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// Callers must avoid forwarding sensitive values in `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `ManiError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ManiError) -> &'static str {
    match error {
        ManiError::Config(_) => "config",
        ManiError::Network(_) => "network",
        ManiError::Auth(_) => "auth",
        ManiError::Security(_) => "security",
        ManiError::NotFound(_) => "not_found",
        ManiError::InvalidInput(_) => "invalid_input",
        ManiError::Internal(_) => "internal",
    }
}

/// Convert an `ApiError` into a stable label suitable for logging.
#[inline]
pub fn api_error_label(error: &ApiError) -> &'static str {
    match error.category() {
        ApiErrorCategory::Authentication => "authentication",
        ApiErrorCategory::Http => "http",
        ApiErrorCategory::Transport => "transport",
        ApiErrorCategory::Request => "invalid_request",
        ApiErrorCategory::Config => "config",
    }
}
