//! # Mani Infrastructure
//!
//! Infrastructure implementations of the auth contracts in `mani-common`.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - The authenticated `ApiClient` (refresh before send, retry once on 401)
//! - The backend session flow (refresh endpoint + logout redirect)
//! - The OS keychain credential vault
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `mani-common`
//! - Depends on `mani-domain` and `mani-common`
//! - Contains all "impure" code (network, keychain, filesystem)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, ApiResponse, BackendSessionFlow,
    MultipartPart, MultipartPayload, RequestBody, RequestDescriptor, TracingRedirect,
};
pub use auth::KeyringVault;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, OutboundRequest, Transport, TransportResponse};
