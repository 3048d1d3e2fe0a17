//! Mani - authenticated request client
//!
//! Main entry point for the `mani` binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mani_domain::Config;
use mani_infra::config;
use mani_infra::observability::init_tracing;
use mani_lib::{run, AppContext, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be applied before the config loader reads the environment
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let (ctx, command) = match setup(cli) {
        Ok(parts) => parts,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::from(1);
        }
    };

    match dotenv {
        Ok(path) => tracing::debug!(?path, "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env file loaded"),
    }

    match run(&ctx, command).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to render output: {}", e);
                ExitCode::from(1)
            }
        },
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn setup(cli: Cli) -> anyhow::Result<(AppContext, mani_lib::Command)> {
    let mut config = load_config(&cli)?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    let config = config::normalize(config).context("invalid configuration")?;

    init_tracing(&config.logging).context("failed to initialise logging")?;
    tracing::info!(base_url = %config.api.base_url, "Mani starting");

    let ctx = AppContext::new(config).context("failed to build application context")?;
    Ok((ctx, cli.command))
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone()))
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => config::load().context("failed to load config")?,
    };
    Ok(config)
}
