//! In-memory credential store with optional persistence
//!
//! Holds the single active credential behind a lock:
//! - created on login, replaced on refresh, cleared on logout
//! - validity checked against the expiry with a configurable skew
//! - optionally mirrored to a [`CredentialVault`] and restored on startup

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::traits::{CredentialStore, CredentialVault};
use super::types::{AuthHeaders, Credential, CredentialStoreError};

/// Process-wide credential store
///
/// Cheap to share behind an `Arc`; every request reads it, refresh and
/// logout write it.
pub struct InMemoryCredentialStore {
    current: RwLock<Option<Credential>>,
    expiry_skew_seconds: i64,
    vault: Option<Arc<dyn CredentialVault>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `expiry_skew_seconds` - Treat credentials expiring within this many
    ///   seconds as invalid
    #[must_use]
    pub fn new(expiry_skew_seconds: i64) -> Self {
        Self { current: RwLock::new(None), expiry_skew_seconds, vault: None }
    }

    /// Create an empty store that mirrors every change to `vault`
    #[must_use]
    pub fn with_vault(vault: Arc<dyn CredentialVault>, expiry_skew_seconds: i64) -> Self {
        Self { current: RwLock::new(None), expiry_skew_seconds, vault: Some(vault) }
    }

    /// Load the persisted credential into memory
    ///
    /// Should be called on startup.
    ///
    /// # Returns
    /// `true` if a credential was loaded, `false` if none was stored (or no
    /// vault is configured)
    ///
    /// # Errors
    /// Returns error if the vault cannot be read
    pub fn restore(&self) -> Result<bool, CredentialStoreError> {
        let Some(vault) = self.vault.as_ref() else {
            return Ok(false);
        };

        match vault.load()? {
            Some(credential) => {
                *self.current.write() = Some(credential);
                info!("Credential store initialized with persisted credential");
                Ok(true)
            }
            None => {
                debug!("No persisted credential found");
                Ok(false)
            }
        }
    }

    /// Store the credential obtained at login
    ///
    /// # Errors
    /// Returns error if persisting fails; the credential is active in memory
    /// either way
    pub fn login(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        self.replace(credential)?;
        info!("Credential stored after login");
        Ok(())
    }

    /// Seconds until the current credential expires
    ///
    /// `None` if there is no credential or it carries no expiry.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.current.read().as_ref().and_then(Credential::seconds_until_expiry)
    }

    /// Whether any credential is stored, valid or not
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Configured expiry skew in seconds
    #[must_use]
    pub fn expiry_skew(&self) -> i64 {
        self.expiry_skew_seconds
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn is_valid(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|c| !c.access_token.is_empty() && !c.is_expired(self.expiry_skew_seconds))
    }

    fn auth_header(&self) -> AuthHeaders {
        self.current.read().as_ref().map(Credential::auth_headers).unwrap_or_default()
    }

    fn current(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    fn replace(&self, credential: Credential) -> Result<(), CredentialStoreError> {
        if let Some(vault) = self.vault.as_ref() {
            if let Err(err) = vault.save(&credential) {
                warn!(error = %err, "Failed to persist credential; keeping it in memory only");
                *self.current.write() = Some(credential);
                return Err(err);
            }
        }

        *self.current.write() = Some(credential);
        debug!("Credential replaced");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.current.write() = None;

        if let Some(vault) = self.vault.as_ref() {
            vault.delete()?;
        }

        info!("Credential cleared (logged out)");
        Ok(())
    }
}
