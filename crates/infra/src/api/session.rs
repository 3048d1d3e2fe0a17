//! Backend session flow
//!
//! Refresh exchanges the current credential at the backend refresh endpoint;
//! logout clears the store and hands off to the redirect hook.

use std::sync::Arc;

use async_trait::async_trait;
use mani_common::auth::{CredentialStore, LogoutRedirect, RefreshResponse, SessionFlow};
use mani_domain::AuthConfig;
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use super::client::join_url;
use super::request::RequestBody;
use crate::http::{OutboundRequest, Transport};

/// [`SessionFlow`] backed by the backend refresh endpoint
pub struct BackendSessionFlow {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LogoutRedirect>,
    refresh_url: String,
    login_route: String,
}

impl BackendSessionFlow {
    /// # Arguments
    ///
    /// * `base_url` - Backend origin the refresh path is joined to
    /// * `auth` - Refresh path and login route
    pub fn new(
        base_url: &str,
        auth: &AuthConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LogoutRedirect>,
    ) -> Self {
        Self {
            transport,
            store,
            redirect,
            refresh_url: join_url(base_url, &auth.refresh_path),
            login_route: auth.login_route.clone(),
        }
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }
}

#[async_trait]
impl SessionFlow for BackendSessionFlow {
    #[instrument(skip(self), fields(url = %self.refresh_url))]
    async fn refresh(&self) -> bool {
        let Some(current) = self.store.current() else {
            debug!("No credential to refresh");
            return false;
        };

        let body = match &current.refresh_token {
            Some(refresh_token) => serde_json::json!({ "refreshToken": refresh_token }),
            None => serde_json::json!({}),
        };

        let mut request = OutboundRequest::new(Method::POST, self.refresh_url.clone());
        request.headers = current.auth_headers();
        request.headers.insert("Content-Type".to_string(), "application/json".to_string());
        request.body = Some(RequestBody::Json(body));

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Refresh request failed");
                return false;
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "Refresh endpoint rejected credential");
            return false;
        }

        let refreshed: RefreshResponse = match serde_json::from_slice(&response.body) {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(error = %err, "Refresh response could not be decoded");
                return false;
            }
        };

        if refreshed.token.is_empty() {
            warn!("Refresh endpoint returned an empty token");
            return false;
        }

        let credential = refreshed.into_credential(current.refresh_token);
        debug!(token_len = credential.access_token.len(), "Received refreshed credential");

        // The store keeps the new credential in memory even when persisting it fails
        if let Err(err) = self.store.replace(credential) {
            warn!(error = %err, "Refreshed credential was not persisted");
        }

        info!("Credential refreshed");
        true
    }

    #[instrument(skip(self))]
    async fn logout(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to remove persisted credential");
        }

        info!(route = %self.login_route, "Session ended");
        self.redirect.redirect(&self.login_route);
    }
}

/// Redirect hook for headless use: logs where the user must sign in again
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRedirect;

impl LogoutRedirect for TracingRedirect {
    fn redirect(&self, route: &str) {
        warn!(route, "Authentication required, sign in again");
    }
}
