//! OS keychain credential vault
//!
//! The whole credential is stored as one JSON secret under
//! `(service, account)`, so a restore never sees a token from one login and
//! an expiry from another.

use keyring::Entry;
use mani_common::auth::{Credential, CredentialStoreError, CredentialVault};
use mani_domain::{AuthConfig, ManiError};
use tracing::debug;

use crate::errors::InfraError;

/// [`CredentialVault`] backed by the platform keychain
#[derive(Debug, Clone)]
pub struct KeyringVault {
    service: String,
    account: String,
}

impl KeyringVault {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service: service.into(), account: account.into() }
    }

    /// Vault addressed by the keychain service/account in `[auth]`
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.keychain_service.clone(), config.keychain_account.clone())
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn entry(&self) -> Result<Entry, CredentialStoreError> {
        Entry::new(&self.service, &self.account).map_err(vault_error)
    }
}

impl CredentialVault for KeyringVault {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                debug!(service = %self.service, account = %self.account, "Loaded credential from keychain");
                decode_credential(&secret).map(Some)
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(vault_error(err)),
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let secret = encode_credential(credential)?;
        self.entry()?.set_password(&secret).map_err(vault_error)?;
        debug!(service = %self.service, account = %self.account, "Stored credential in keychain");
        Ok(())
    }

    fn delete(&self) -> Result<(), CredentialStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, account = %self.account, "Deleted keychain credential");
                Ok(())
            }
            Err(err) => Err(vault_error(err)),
        }
    }
}

fn vault_error(err: keyring::Error) -> CredentialStoreError {
    let mapped: ManiError = InfraError::from(err).into();
    CredentialStoreError::Vault(mapped.to_string())
}

fn encode_credential(credential: &Credential) -> Result<String, CredentialStoreError> {
    serde_json::to_string(credential).map_err(|e| CredentialStoreError::Corrupt(e.to_string()))
}

fn decode_credential(secret: &str) -> Result<Credential, CredentialStoreError> {
    serde_json::from_str(secret).map_err(|e| CredentialStoreError::Corrupt(e.to_string()))
}
