//! Application context - dependency injection container

use std::sync::Arc;

use mani_common::auth::{
    CredentialVault, InMemoryCredentialStore, LogoutRedirect, SessionFlow, SingleFlightSession,
};
use mani_domain::{Config, ManiError, Result};
use mani_infra::api::{ApiClient, BackendSessionFlow, TracingRedirect};
use mani_infra::http::{HttpClient, Transport};
use mani_infra::KeyringVault;
use tracing::{info, warn};

/// Application context - holds the credential store, session flow and client
pub struct AppContext {
    pub config: Config,
    pub store: Arc<InMemoryCredentialStore>,
    pub session: Arc<dyn SessionFlow>,
    pub client: ApiClient,
}

impl AppContext {
    /// Build the context with the OS keychain as credential vault
    ///
    /// # Errors
    /// Returns error if the HTTP transport cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let vault = Arc::new(KeyringVault::from_config(&config.auth));
        Self::with_parts(config, vault, Arc::new(TracingRedirect))
    }

    /// Build the context with explicit persistence and redirect hooks
    ///
    /// The persisted credential, if any, is restored before returning. A
    /// vault that cannot be read leaves the session signed out.
    ///
    /// # Errors
    /// Returns error if the HTTP transport cannot be built
    pub fn with_parts(
        config: Config,
        vault: Arc<dyn CredentialVault>,
        redirect: Arc<dyn LogoutRedirect>,
    ) -> Result<Self> {
        let store =
            Arc::new(InMemoryCredentialStore::with_vault(vault, config.auth.expiry_skew_seconds));

        match store.restore() {
            Ok(true) => info!("Restored persisted credential"),
            Ok(false) => info!("No persisted credential, signed out"),
            Err(err) => warn!(error = %err, "Could not read persisted credential"),
        }

        let transport: Arc<dyn Transport> = Arc::new(HttpClient::from_config(&config.api)?);

        let flow = BackendSessionFlow::new(
            &config.api.base_url,
            &config.auth,
            transport.clone(),
            store.clone(),
            redirect,
        );
        let session: Arc<dyn SessionFlow> = if config.auth.dedupe_refresh {
            info!("Concurrent refreshes share one in-flight request");
            Arc::new(SingleFlightSession::new(flow))
        } else {
            Arc::new(flow)
        };

        let client = ApiClient::builder()
            .config(config.api.clone())
            .transport(transport)
            .credential_store(store.clone())
            .session(session.clone())
            .build()
            .map_err(|e| ManiError::Config(e.to_string()))?;

        Ok(Self { config, store, session, client })
    }
}
