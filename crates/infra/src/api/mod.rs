//! Authenticated API client for the church backend
//!
//! This module sends requests on behalf of the signed-in administrator. It
//! handles credential checks, refresh, a single retry after a 401, and
//! logout when the session cannot be recovered.
//!
//! # Architecture
//!
//! - Sends through the [`Transport`](crate::http::Transport) seam (no direct
//!   reqwest in the retry logic)
//! - Credential state lives in a `CredentialStore`; refresh and logout in a
//!   `SessionFlow`, both from `mani-common`
//! - Request bodies are re-buildable so the retried request is identical
//!
//! # Logging
//!
//! Structured `tracing` fields only. Token values are never logged.

pub mod client;
pub mod errors;
pub mod request;
pub mod session;

pub use client::{join_url, ApiClient, ApiClientBuilder, ApiResponse};
pub use reqwest::Method;
pub use errors::{ApiError, ApiErrorCategory};
pub use request::{MediaFile, MultipartPart, MultipartPayload, RequestBody, RequestDescriptor};
pub use session::{BackendSessionFlow, TracingRedirect};
