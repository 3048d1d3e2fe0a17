//! Command-line interface definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Authenticated client for the church backend
#[derive(Debug, Parser)]
#[command(name = "mani", version, about)]
pub struct Cli {
    /// Config file (JSON or TOML); defaults to env vars, then probed files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the backend origin
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a credential obtained from the backend login
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        /// Lifetime in seconds; read from the JWT `exp` claim when omitted
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Clear the stored credential
    Logout,
    /// Show whether a usable credential is stored
    Status,
    /// GET a path
    Get(RequestArgs),
    /// POST a JSON body
    Post(BodyArgs),
    /// PUT a JSON body
    Put(BodyArgs),
    /// DELETE a path
    Delete(RequestArgs),
    /// Upload video or image files as a multipart form
    Upload {
        #[command(flatten)]
        request: RequestArgs,
        /// Files to upload (at most five)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Path relative to the backend origin
    pub path: String,

    /// Extra header, `name:value`; repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// JSON body
    #[arg(long)]
    pub json: String,
}

/// Parse a `name:value` header argument
///
/// # Errors
/// Returns a message if the colon is missing or the name is empty
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) =
        raw.split_once(':').ok_or_else(|| format!("expected name:value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
