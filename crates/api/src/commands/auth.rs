//! Credential commands

use mani_common::auth::{Credential, CredentialStore};
use mani_domain::ManiError;
use serde_json::{json, Value};
use tracing::info;

use super::CommandError;
use crate::context::AppContext;

/// Store a credential issued by the backend login
///
/// # Errors
/// Returns `ManiError::InvalidInput` for an empty token and
/// `ManiError::Security` if the keychain write fails
pub fn login(
    ctx: &AppContext,
    token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
) -> Result<Value, CommandError> {
    if token.trim().is_empty() {
        return Err(ManiError::InvalidInput("token must not be empty".into()).into());
    }

    ctx.store
        .login(Credential::new(token, refresh_token, expires_in))
        .map_err(|e| ManiError::Security(e.to_string()))?;

    info!("Signed in");
    Ok(status(ctx))
}

/// End the session; the redirect hook reports where to sign in again
pub async fn logout(ctx: &AppContext) -> Value {
    ctx.session.logout().await;
    json!({ "authenticated": false, "login_route": ctx.config.auth.login_route })
}

pub fn status(ctx: &AppContext) -> Value {
    json!({
        "authenticated": ctx.store.is_authenticated(),
        "valid": ctx.store.is_valid(),
        "expires_in_seconds": ctx.store.seconds_until_expiry(),
        "base_url": ctx.client.base_url(),
    })
}
