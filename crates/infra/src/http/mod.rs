//! HTTP transport
//!
//! [`Transport`] is the network seam the API client and the session flow
//! send through; [`HttpClient`] is its reqwest implementation.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, OutboundRequest, Transport, TransportResponse};
