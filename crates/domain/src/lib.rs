//! # Mani Domain
//!
//! Domain types shared by every Mani crate.
//!
//! This crate contains:
//! - The domain error type and `Result` alias
//! - Configuration structures for the API client, auth flow and logging
//! - Domain constants (backend origin, auth routes, upload limits)
//!
//! ## Architecture
//! - No dependencies on other Mani crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
