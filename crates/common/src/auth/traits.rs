//! Traits for credential storage and session operations
//!
//! These traits are the seams the API client is built against. Production
//! code plugs in the in-memory store, the backend session flow and the OS
//! keychain; tests plug in the mocks from `testing`.

use async_trait::async_trait;

use super::types::{AuthHeaders, Credential, CredentialStoreError};

/// Holder of the single active credential
///
/// Reads are synchronous: deciding validity and building headers never waits
/// on I/O.
pub trait CredentialStore: Send + Sync {
    /// Whether a credential exists and is not expired
    fn is_valid(&self) -> bool;

    /// Headers that authenticate a request with the current credential
    ///
    /// Empty when no credential is stored.
    fn auth_header(&self) -> AuthHeaders;

    /// Snapshot of the current credential
    fn current(&self) -> Option<Credential>;

    /// Replace the active credential (login or successful refresh)
    ///
    /// # Errors
    /// Returns error if persisting the credential fails. The in-memory value
    /// is replaced regardless.
    fn replace(&self, credential: Credential) -> Result<(), CredentialStoreError>;

    /// Remove the active credential (logout)
    ///
    /// # Errors
    /// Returns error if deleting the persisted copy fails. The in-memory value
    /// is cleared regardless.
    fn clear(&self) -> Result<(), CredentialStoreError>;
}

/// Refresh and logout operations consumed by the API client
#[async_trait]
pub trait SessionFlow: Send + Sync {
    /// Exchange the current credential for a new one
    ///
    /// Returns `true` when a new credential has been stored, `false` on any
    /// failure. Never errors.
    async fn refresh(&self) -> bool;

    /// Clear the stored credential and send the user back to authentication
    async fn logout(&self);
}

/// Persistent backing for the credential store
pub trait CredentialVault: Send + Sync {
    /// Load the persisted credential, `Ok(None)` if nothing is stored
    ///
    /// # Errors
    /// Returns error if the backend is unreachable or the entry is corrupt
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    /// Persist the credential, overwriting any previous one
    ///
    /// # Errors
    /// Returns error if the write fails
    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Delete the persisted credential (idempotent)
    ///
    /// # Errors
    /// Returns error if the delete fails
    fn delete(&self) -> Result<(), CredentialStoreError>;
}

/// Navigation side effect triggered by logout
pub trait LogoutRedirect: Send + Sync {
    /// Send the user to `route` to authenticate again
    fn redirect(&self, route: &str);
}
