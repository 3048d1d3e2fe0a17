//! Credential persistence backends

pub mod keychain;

pub use keychain::KeyringVault;
