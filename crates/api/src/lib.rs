//! # Mani CLI
//!
//! Application layer for the authenticated request client.
//!
//! This crate contains:
//! - Command-line definition (`cli`)
//! - Command handlers (`commands`)
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `domain`, `common`, and `infra`
//! - Wires the credential store, session flow and transport into one client

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

pub use cli::{Cli, Command};
pub use commands::{run, CommandError};
pub use context::AppContext;
