//! Authenticated API client
//!
//! Every call runs the same bounded state machine:
//!
//! ```text
//! CHECK_TOKEN ─► (REFRESH_IF_INVALID) ─► SEND ─┬─ 2xx ──────────────► DONE
//!                                               ├─ 401, retry left ──► REFRESH ─► CHECK_TOKEN
//!                                               └─ other ────────────► FAIL
//! ```
//!
//! A failed refresh always logs the session out and ends the call with
//! [`ApiError::Authentication`]. A 401 on the retried send is returned as an
//! ordinary [`ApiError::Http`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use mani_common::auth::{CredentialStore, SessionFlow};
use mani_domain::constants::MAX_AUTH_RETRIES;
use mani_domain::ApiConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use super::request::{MediaFile, MultipartPayload, RequestBody, RequestDescriptor};
use crate::http::{HttpClient, OutboundRequest, Transport, TransportResponse};

const UNAUTHORIZED: u16 = 401;
const NO_CONTENT: u16 = 204;
const RESET_CONTENT: u16 = 205;

/// Decoded body and status of a successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
}

/// Client for the church backend
///
/// Holds no state between calls besides its collaborators; concurrent calls
/// each run their own state machine.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    session: Arc<dyn SessionFlow>,
    base_url: String,
}

impl ApiClient {
    /// Create a client that sends through `transport`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend origin (e.g., "http://localhost:5000")
    /// * `transport` - Network transport
    /// * `store` - Credential store consulted before every send
    /// * `session` - Refresh/logout flow
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        session: Arc<dyn SessionFlow>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { transport, store, session, base_url }
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.execute(RequestDescriptor::get(path)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(RequestDescriptor::post(path).json(body)?).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(RequestDescriptor::put(path).json(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// Empty and 204/205 responses decode as `null`, so `ApiResponse<()>`
    /// works when only the status matters.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(RequestDescriptor::delete(path)).await
    }

    /// Send `request` with `payload` as its multipart body
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute`]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
        payload: MultipartPayload,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.execute(request.multipart(payload)).await
    }

    /// Upload media files from disk as repeated `media` parts
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` if a file cannot be read, is not
    /// a video or image, or too many are given; otherwise see
    /// [`ApiClient::execute`]
    pub async fn upload_media<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
        files: &[PathBuf],
    ) -> Result<ApiResponse<T>, ApiError> {
        let mut media = Vec::with_capacity(files.len());
        for file in files {
            media.push(MediaFile::from_path(file).await?);
        }
        self.upload(request, MultipartPayload::media_files(media)?).await
    }

    /// Run one logical call
    ///
    /// # Errors
    ///
    /// - `ApiError::Authentication` if a refresh failed (the session has been
    ///   logged out)
    /// - `ApiError::Http` for non-2xx statuses, including a 401 on the
    ///   retried send
    /// - `ApiError::Transport` if the server was unreachable or the body
    ///   could not be decoded
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<ApiResponse<T>, ApiError> {
        let url = self.url_for(request.path());
        let mut auth_retries = 0;

        loop {
            self.ensure_valid_credential().await?;

            let response = self.send_once(&request, &url).await?;

            if response.status == UNAUTHORIZED && auth_retries < MAX_AUTH_RETRIES {
                auth_retries += 1;
                warn!(attempt = auth_retries, "Server rejected credential, refreshing");

                if self.session.refresh().await {
                    continue;
                }
                return Err(self.end_session("credential refresh after 401 failed").await);
            }

            if !response.is_success() {
                return Err(Self::map_status_error(&response, &url));
            }

            let data = Self::decode(&response)?;
            info!(status = response.status, "Request successful");
            return Ok(ApiResponse { data, status: response.status });
        }
    }

    async fn ensure_valid_credential(&self) -> Result<(), ApiError> {
        if self.store.is_valid() {
            return Ok(());
        }

        debug!("Credential invalid, refreshing before send");
        if self.session.refresh().await {
            return Ok(());
        }

        Err(self.end_session("credential refresh failed").await)
    }

    async fn end_session(&self, reason: &str) -> ApiError {
        warn!(reason, "Logging out");
        self.session.logout().await;
        ApiError::Authentication(reason.to_string())
    }

    async fn send_once(
        &self,
        request: &RequestDescriptor,
        url: &str,
    ) -> Result<TransportResponse, ApiError> {
        let outbound = OutboundRequest {
            method: request.method().clone(),
            url: url.to_string(),
            headers: merge_headers(
                self.store.auth_header(),
                request.body_ref(),
                request.header_overrides(),
            ),
            body: request.body_ref().cloned(),
        };

        debug!(url = %url, "Sending request");

        self.transport.send(outbound).await.map_err(ApiError::from)
    }

    fn decode<T: DeserializeOwned>(response: &TransportResponse) -> Result<T, ApiError> {
        let empty = response.body.iter().all(u8::is_ascii_whitespace);

        if response.status == NO_CONTENT || response.status == RESET_CONTENT || empty {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Transport(format!(
                    "Empty response ({}), but response type cannot be deserialized from null",
                    response.status
                ))
            });
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::Transport(format!("Failed to parse response: {}", e)))
    }

    fn map_status_error(response: &TransportResponse, url: &str) -> ApiError {
        let detail = error_detail(response);
        let message = if detail.is_empty() {
            format!("{} returned status {}", url, response.status)
        } else {
            format!("{} returned status {}: {}", url, response.status, detail)
        };

        ApiError::Http { status: response.status, message }
    }
}

/// Join an origin and a relative path with exactly one `/` between them
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Auth headers, then the body's content type, then caller overrides
///
/// Names compare case-insensitively and later layers win. Multipart bodies
/// never carry an explicit content type.
fn merge_headers(
    auth: BTreeMap<String, String>,
    body: Option<&RequestBody>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    fn insert(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.to_string(), value.to_string());
    }

    let mut headers = auth;

    if let Some(content_type) = body.and_then(RequestBody::content_type) {
        insert(&mut headers, "Content-Type", content_type);
    }

    for (name, value) in overrides {
        insert(&mut headers, name, value);
    }

    if body.is_some_and(RequestBody::is_multipart) {
        headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
    }

    headers
}

/// Readable detail from an error body: the `message`/`error` field of a JSON
/// body, or the raw text
fn error_detail(response: &TransportResponse) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(&response.body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }

    response.text().trim().to_string()
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiConfig>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    session: Option<Arc<dyn SessionFlow>>,
}

impl ApiClientBuilder {
    /// Set the API configuration (base URL, timeout, user agent)
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the transport; defaults to an [`HttpClient`] built from the
    /// configuration
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionFlow>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if the store or session is missing, or the default
    /// transport cannot be created
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let store =
            self.store.ok_or_else(|| ApiError::Config("Credential store not set".to_string()))?;
        let session =
            self.session.ok_or_else(|| ApiError::Config("Session flow not set".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpClient::from_config(&config).map_err(|e| {
                ApiError::Config(format!("Failed to build HttpClient: {}", e))
            })?),
        };

        Ok(ApiClient::new(config.base_url, transport, store, session))
    }
}
