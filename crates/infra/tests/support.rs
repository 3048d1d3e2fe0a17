//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use mani_common::auth::{CredentialStore, SessionFlow};
use mani_common::testing::{MockCredentialStore, MockSessionFlow};
use mani_domain::ApiConfig;
use mani_infra::api::ApiClient;
use wiremock::{MockServer, Request};

/// Client wired to a mock server, a mock store and a scripted session flow.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MockCredentialStore>,
    pub session: Arc<MockSessionFlow>,
    pub client: ApiClient,
}

impl Harness {
    /// Start a mock server; `script` configures the session flow.
    pub async fn start(
        store: MockCredentialStore,
        script: impl FnOnce(MockSessionFlow) -> MockSessionFlow,
    ) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let session = Arc::new(script(MockSessionFlow::new(store.clone())));
        let client = client_for(&server, store.clone(), session.clone());

        Self { server, store, session, client }
    }

    pub async fn received(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// Build a client with the default reqwest transport.
pub fn client_for(
    server: &MockServer,
    store: Arc<dyn CredentialStore>,
    session: Arc<dyn SessionFlow>,
) -> ApiClient {
    ApiClient::builder()
        .config(ApiConfig { base_url: server.uri(), ..Default::default() })
        .credential_store(store)
        .session(session)
        .build()
        .expect("api client should build")
}

/// Value of a header on a received request.
pub fn header_value(request: &Request, name: &str) -> Option<String> {
    request.headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}

/// `Authorization` header of every received request, in order.
pub fn authorizations(requests: &[Request]) -> Vec<Option<String>> {
    requests.iter().map(|request| header_value(request, "authorization")).collect()
}
