use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use mani_domain::constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use mani_domain::{ApiConfig, ManiError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::api::request::RequestBody;
use crate::errors::InfraError;

/// Fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: BTreeMap::new(), body: None }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Every HTTP status is a successful exchange here; only failures to reach
/// the server or read its reply are errors. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ManiError>;
}

/// reqwest-backed [`Transport`] with a request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ManiError> {
        Self::builder().build()
    }

    /// Client configured from the `[api]` section.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ManiError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: OutboundRequest) -> Result<TransportResponse, ManiError> {
        let has_content_type = request.header(CONTENT_TYPE.as_str()).is_some();
        let OutboundRequest { method, url, headers, body } = request;

        let mut builder = self.client.request(method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match body {
            None => builder,
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(&value).map_err(|err| {
                    ManiError::InvalidInput(format!("JSON body could not be encoded: {err}"))
                })?;
                if has_content_type {
                    builder.body(bytes)
                } else {
                    builder.header(CONTENT_TYPE, "application/json").body(bytes)
                }
            }
            Some(RequestBody::Bytes { data, .. }) => builder.body(data),
            Some(RequestBody::Multipart(payload)) => {
                let form = payload.to_form().map_err(|err| ManiError::from(InfraError::from(err)))?;
                builder.multipart(form)
            }
        };

        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            ManiError::from(InfraError::from(err))
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ManiError::from(InfraError::from(err)))?
            .to_vec();

        debug!(%method, %url, status, bytes = body.len(), "received HTTP response");

        Ok(TransportResponse { status, body })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, ManiError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            ManiError::from(infra)
        })?;

        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::request::{MultipartPart, MultipartPayload};

    fn client() -> HttpClient {
        HttpClient::builder().timeout(Duration::from_secs(5)).build().expect("http client")
    }

    #[tokio::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .expect(1)
            .mount(&server)
            .await;

        let response = client()
            .send(OutboundRequest::new(Method::GET, format!("{}/ping", server.uri())))
            .await
            .expect("response");

        assert!(response.is_success());
        assert_eq!(response.text(), "pong");
    }

    #[tokio::test]
    async fn server_errors_are_returned_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let response =
            client().send(OutboundRequest::new(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status, 500);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn json_body_defaults_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut request = OutboundRequest::new(Method::POST, server.uri());
        request.body = Some(RequestBody::Json(serde_json::json!({ "title": "Sunday service" })));

        let response = client().send(request).await.expect("response");
        assert_eq!(response.status, 201);

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["title"], "Sunday service");
    }

    #[tokio::test]
    async fn multipart_body_sets_boundary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("Content-Type"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let payload = MultipartPayload::new().part(MultipartPart::file(
            "media",
            "sermon.mp4",
            "video/mp4",
            b"frames".to_vec(),
        ));
        let mut request = OutboundRequest::new(Method::POST, server.uri());
        request.body = Some(RequestBody::Multipart(payload));

        client().send(request).await.expect("response");

        let received = server.received_requests().await.unwrap();
        let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert!(String::from_utf8_lossy(&received[0].body).contains("sermon.mp4"));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let result =
            client().send(OutboundRequest::new(Method::GET, format!("http://{}", addr))).await;

        match result {
            Err(ManiError::Network(msg)) => assert!(msg.to_lowercase().contains("http")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut request = OutboundRequest::new(Method::GET, "http://localhost");
        request.headers.insert("content-type".into(), "text/plain".into());

        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("Authorization"), None);
    }
}
