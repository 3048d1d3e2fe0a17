//! Credential types and structures
//!
//! Defines the bearer credential held by the store, the payload returned by
//! the backend refresh endpoint, and the store error type.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header name → value pairs that authenticate a request
pub type AuthHeaders = BTreeMap<String, String>;

/// Errors raised by credential stores and vaults
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialStoreError {
    /// Persistent storage could not be read or written
    #[error("Credential vault error: {0}")]
    Vault(String),

    /// Stored credential could not be decoded
    #[error("Stored credential is corrupt: {0}")]
    Corrupt(String),
}

/// Bearer credential used to authenticate requests against the backend
///
/// Optional fields:
/// - `refresh_token`: only present when the backend issued one at login
/// - `expires_at`: taken from `expiresIn`, or from the JWT `exp` claim when the
///   access token is a JWT; `None` means the token carries no known expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque bearer token
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Absolute expiration timestamp (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credential {
    /// Create a credential, deriving the expiry from `expires_in` when given
    /// and from the JWT `exp` claim otherwise.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        let access_token = access_token.into();
        let expires_at = match expires_in {
            Some(seconds) if seconds > 0 => offset_from_now(seconds),
            _ => jwt_expiry(&access_token),
        };

        Self { access_token, refresh_token, token_type: default_token_type(), expires_at }
    }

    /// Credential with no refresh token, expiring per the JWT `exp` claim if any
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::new(access_token, None, None)
    }

    /// Override the expiry timestamp
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Check if the token is expired or will expire within `skew_seconds`
    ///
    /// A credential without an expiry is never considered expired. A skew
    /// too large to represent counts as expired.
    #[must_use]
    pub fn is_expired(&self, skew_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => offset_from_now(skew_seconds).map_or(true, |now| now >= expires_at),
            None => false,
        }
    }

    /// Seconds until expiry, or `None` if no expiry is known
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Headers that authenticate a request with this credential
    #[must_use]
    pub fn auth_headers(&self) -> AuthHeaders {
        let mut headers = AuthHeaders::new();
        headers.insert("Authorization".to_string(), self.authorization_value());
        headers
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response body of the backend refresh endpoint
///
/// Accepts both the camelCase shape the backend emits and the snake_case
/// OAuth shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,

    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,

    #[serde(default, alias = "expires_in")]
    pub expires_in: Option<i64>,
}

impl RefreshResponse {
    /// Build the replacement credential, keeping the previous refresh token
    /// when the backend did not rotate it.
    #[must_use]
    pub fn into_credential(self, previous_refresh_token: Option<String>) -> Credential {
        Credential::new(self.token, self.refresh_token.or(previous_refresh_token), self.expires_in)
    }
}

/// `now + seconds`, or `None` when the result is outside chrono's range
fn offset_from_now(seconds: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(seconds).and_then(|delta| Utc::now().checked_add_signed(delta))
}

#[derive(Deserialize)]
struct JwtExpiryClaim {
    exp: Option<i64>,
}

/// Read the `exp` claim of a JWT without verifying its signature
///
/// Returns `None` for tokens that are not three-segment JWTs or carry no
/// `exp` claim.
#[must_use]
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: JwtExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claim.exp?, 0)
}
