//! CLI commands
//!
//! Each command returns a JSON value for stdout or a classified
//! [`CommandError`].

mod auth;
mod request;

use std::time::Instant;

use mani_domain::ManiError;
use mani_infra::api::{ApiError, Method};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub use auth::{login, logout, status};
pub use request::{send, upload};

use crate::cli::Command;
use crate::context::AppContext;
use crate::utils::logging::{api_error_label, error_label, log_command_execution};

/// Failure of a CLI command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Domain(#[from] ManiError),
}

impl CommandError {
    /// Stable label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Api(err) => api_error_label(err),
            Self::Domain(err) => error_label(err),
        }
    }

    /// Process exit code: 2 usage, 3 authentication, 4 HTTP, 5 transport, 1 other
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Api(ApiError::Authentication(_)) => 3,
            Self::Api(ApiError::Http { .. }) => 4,
            Self::Api(ApiError::Transport(_)) => 5,
            Self::Api(ApiError::InvalidRequest(_)) | Self::Domain(ManiError::InvalidInput(_)) => 2,
            _ => 1,
        }
    }
}

/// Run `command` and log its outcome
///
/// # Errors
/// Returns the command's failure, classified
pub async fn run(ctx: &AppContext, command: Command) -> Result<Value, CommandError> {
    let name = command_name(&command);
    let start = Instant::now();

    let result = match command {
        Command::Login { token, refresh_token, expires_in } => {
            login(ctx, token, refresh_token, expires_in)
        }
        Command::Logout => Ok(logout(ctx).await),
        Command::Status => Ok(status(ctx)),
        Command::Get(args) => send(ctx, Method::GET, args, None).await,
        Command::Delete(args) => send(ctx, Method::DELETE, args, None).await,
        Command::Post(args) => send(ctx, Method::POST, args.request, Some(&args.json)).await,
        Command::Put(args) => send(ctx, Method::PUT, args.request, Some(&args.json)).await,
        Command::Upload { request, files } => upload(ctx, request, &files).await,
    };

    log_command_execution(name, start.elapsed(), result.is_ok());
    if let Err(err) = &result {
        warn!(command = name, error_type = err.label(), "Command failed");
    }

    result
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "auth::login",
        Command::Logout => "auth::logout",
        Command::Status => "auth::status",
        Command::Get(_) => "request::get",
        Command::Post(_) => "request::post",
        Command::Put(_) => "request::put",
        Command::Delete(_) => "request::delete",
        Command::Upload { .. } => "request::upload",
    }
}
