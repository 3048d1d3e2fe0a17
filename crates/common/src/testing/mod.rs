//! Testing utilities and helpers
//!
//! Mock implementations of the [`crate::auth`] traits, used by this crate's
//! unit tests and, through the `test-utils` feature, by downstream test
//! suites:
//! - [`MockCredentialStore`]: validity controlled by the test
//! - [`MockSessionFlow`]: scripted refresh outcomes, call counters
//! - [`MemoryVault`]: in-memory persistence with injectable write failures
//! - [`RecordingRedirect`]: records logout redirects
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use mani_common::testing::{MockCredentialStore, MockSessionFlow};
//!
//! let store = Arc::new(MockCredentialStore::invalid("expired"));
//! let session = MockSessionFlow::new(store.clone()).then_refresh_to("fresh");
//! assert_eq!(session.refresh_calls(), 0);
//! ```

pub mod mocks;

pub use mocks::{MemoryVault, MockCredentialStore, MockSessionFlow, RecordingRedirect};
