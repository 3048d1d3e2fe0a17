//! Mock implementations of the auth traits
//!
//! All mocks count their calls so tests can assert on how often the client
//! touched each collaborator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{
    AuthHeaders, Credential, CredentialStore, CredentialStoreError, CredentialVault,
    LogoutRedirect, SessionFlow,
};

#[derive(Debug, Default)]
struct StoreState {
    token: Option<String>,
    valid: bool,
}

/// Credential store whose validity is set by the test, not by expiry
#[derive(Debug, Default)]
pub struct MockCredentialStore {
    state: Mutex<StoreState>,
    validity_checks: AtomicUsize,
}

impl MockCredentialStore {
    /// Store holding `token`, reported as valid
    pub fn valid(token: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(StoreState { token: Some(token.into()), valid: true }),
            validity_checks: AtomicUsize::new(0),
        }
    }

    /// Store holding `token`, reported as invalid (e.g. expired)
    pub fn invalid(token: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(StoreState { token: Some(token.into()), valid: false }),
            validity_checks: AtomicUsize::new(0),
        }
    }

    /// Store with no credential at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overwrite the held token and its validity
    pub fn set(&self, token: impl Into<String>, valid: bool) {
        let mut state = self.state.lock();
        state.token = Some(token.into());
        state.valid = valid;
    }

    /// Currently held token
    pub fn token(&self) -> Option<String> {
        self.state.lock().token.clone()
    }

    /// Number of `is_valid` calls so far
    pub fn validity_checks(&self) -> usize {
        self.validity_checks.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MockCredentialStore {
    fn is_valid(&self) -> bool {
        self.validity_checks.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock();
        state.valid && state.token.is_some()
    }

    fn auth_header(&self) -> AuthHeaders {
        self.state
            .lock()
            .token
            .as_ref()
            .map(|token| Credential::bearer(token.clone()).auth_headers())
            .unwrap_or_default()
    }

    fn current(&self) -> Option<Credential> {
        self.state.lock().token.clone().map(Credential::bearer)
    }

    fn replace(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        self.set(credential.access_token, true);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let mut state = self.state.lock();
        state.token = None;
        state.valid = false;
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RefreshStep {
    Succeed(String),
    Fail,
}

/// Scripted session flow
///
/// Each `refresh` consumes the next scripted step; once the script is empty
/// every refresh fails. A successful step rotates the linked store to the
/// scripted token. `logout` clears the store.
pub struct MockSessionFlow {
    store: Arc<dyn CredentialStore>,
    script: Mutex<VecDeque<RefreshStep>>,
    delay: Option<Duration>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl MockSessionFlow {
    /// Session flow acting on `store`, with an empty script
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            script: Mutex::new(VecDeque::new()),
            delay: None,
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    /// Next refresh succeeds and stores `token`
    #[must_use]
    pub fn then_refresh_to(self, token: impl Into<String>) -> Self {
        self.script.lock().push_back(RefreshStep::Succeed(token.into()));
        self
    }

    /// Next refresh fails
    #[must_use]
    pub fn then_fail_refresh(self) -> Self {
        self.script.lock().push_back(RefreshStep::Fail);
        self
    }

    /// Sleep this long inside every refresh
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFlow for MockSessionFlow {
    async fn refresh(&self) -> bool {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.script.lock().pop_front();
        match step {
            Some(RefreshStep::Succeed(token)) => {
                self.store.replace(Credential::bearer(token)).is_ok()
            }
            Some(RefreshStep::Fail) | None => false,
        }
    }

    async fn logout(&self) {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.store.clear();
    }
}

/// Vault that keeps the credential in memory
#[derive(Debug, Default)]
pub struct MemoryVault {
    stored: Mutex<Option<Credential>>,
    fail_writes: Mutex<bool>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vault pre-populated with `credential`
    pub fn with_credential(credential: Credential) -> Self {
        Self { stored: Mutex::new(Some(credential)), fail_writes: Mutex::new(false) }
    }

    /// Make `save` and `delete` fail
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn stored(&self) -> Option<Credential> {
        self.stored.lock().clone()
    }

    fn check_writable(&self) -> Result<(), CredentialStoreError> {
        if *self.fail_writes.lock() {
            return Err(CredentialStoreError::Vault("vault is read-only".into()));
        }
        Ok(())
    }
}

impl CredentialVault for MemoryVault {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.stored.lock().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        *self.stored.lock() = Some(credential.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), CredentialStoreError> {
        self.check_writable()?;
        *self.stored.lock() = None;
        Ok(())
    }
}

/// Redirect hook that records every route it was sent to
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    routes: Mutex<Vec<String>>,
}

impl RecordingRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().clone()
    }
}

impl LogoutRedirect for RecordingRedirect {
    fn redirect(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}
