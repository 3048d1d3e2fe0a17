//! Tracing subscriber setup
//!
//! `RUST_LOG` overrides the configured filter. Output goes to stderr so
//! command output on stdout stays machine-readable.

use mani_domain::{LogFormat, LoggingConfig, ManiError};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// # Errors
/// Returns `ManiError::Config` if the filter is invalid or a subscriber is
/// already installed
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ManiError> {
    let filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .try_init(),
    };

    result.map_err(|e| ManiError::Config(format!("Failed to initialise tracing: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ManiError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| ManiError::Config(format!("Invalid log filter '{}': {}", config.filter, e))),
    }
}
