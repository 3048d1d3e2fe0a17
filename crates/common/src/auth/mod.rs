//! Credential lifecycle for the Mani API client
//!
//! This module owns the single active bearer credential and the contracts the
//! authenticated request client consumes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    ApiClient    │  (mani-infra) check → send → refresh-and-retry-once
//! └────────┬────────┘
//!          │
//!          ├──► CredentialStore    is_valid / auth_header
//!          │         │
//!          │         └──► CredentialVault   (optional persistence)
//!          │
//!          └──► SessionFlow        refresh / logout
//!                    │
//!                    └──► LogoutRedirect    (navigation side effect)
//! ```
//!
//! # Lifecycle
//!
//! A credential is created on login ([`InMemoryCredentialStore::login`]), read
//! before every request, replaced on a successful refresh and cleared on
//! logout. Exactly one credential is active at a time.
//!
//! # Concurrent refresh
//!
//! Independent requests that both observe an invalid credential would each
//! trigger a refresh. Wrapping the session flow in [`SingleFlightSession`]
//! makes concurrent callers share one in-flight refresh instead.
//!
//! # Module Organization
//!
//! - **[`types`]**: `Credential`, `RefreshResponse`, JWT expiry decoding
//! - **[`traits`]**: `CredentialStore`, `SessionFlow`, `CredentialVault`,
//!   `LogoutRedirect`
//! - **[`store`]**: in-memory store with optional vault persistence
//! - **[`single_flight`]**: refresh deduplication wrapper

pub mod single_flight;
pub mod store;
pub mod traits;
pub mod types;

pub use single_flight::SingleFlightSession;
pub use store::InMemoryCredentialStore;
pub use traits::{CredentialStore, CredentialVault, LogoutRedirect, SessionFlow};
pub use types::{AuthHeaders, Credential, CredentialStoreError, RefreshResponse};
