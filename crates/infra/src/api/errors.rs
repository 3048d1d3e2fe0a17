//! API-specific error types
//!
//! Classifies failures of the authenticated client: authentication that
//! could not be recovered, HTTP statuses the server returned, and transport
//! failures below HTTP.

use mani_domain::ManiError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Refresh failed; the session was logged out
    Authentication,
    /// Server answered with a non-2xx status
    Http,
    /// Network failure or undecodable response
    Transport,
    /// Request could not be built (bad body, bad header)
    Request,
    /// Client could not be constructed
    Config,
}

/// API operation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Always preceded by a logout
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Authentication(_) => ApiErrorCategory::Authentication,
            Self::Http { .. } => ApiErrorCategory::Http,
            Self::Transport(_) => ApiErrorCategory::Transport,
            Self::InvalidRequest(_) => ApiErrorCategory::Request,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// HTTP status attached to the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Transport and configuration failures surface as domain errors below the
/// client.
impl From<ManiError> for ApiError {
    fn from(err: ManiError) -> Self {
        match err {
            ManiError::InvalidInput(message) => Self::InvalidRequest(message),
            ManiError::Config(message) => Self::Config(message),
            ManiError::Network(message)
            | ManiError::Auth(message)
            | ManiError::Security(message)
            | ManiError::NotFound(message)
            | ManiError::Internal(message) => Self::Transport(message),
        }
    }
}
