//! Common utilities shared across Mani crates.
//!
//! # Modules
//!
//! - [`auth`]: credential model, the store/session/vault contracts consumed by
//!   the API client, the in-memory credential store and the single-flight
//!   refresh guard
//! - `testing` (feature `test-utils`): mock stores, session flows, vaults and
//!   redirect hooks

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{
    AuthHeaders, Credential, CredentialStore, CredentialStoreError, CredentialVault,
    InMemoryCredentialStore, LogoutRedirect, RefreshResponse, SessionFlow, SingleFlightSession,
};
