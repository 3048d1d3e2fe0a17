//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use mani_domain::ManiError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ManiError);

impl From<InfraError> for ManiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ManiError> for InfraError {
    fn from(value: ManiError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoManiError {
    fn into_mani(self) -> ManiError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → ManiError */
/* -------------------------------------------------------------------------- */

impl IntoManiError for KeyringError {
    fn into_mani(self) -> ManiError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => ManiError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                ManiError::Security("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => ManiError::Security(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                ManiError::Security(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => ManiError::Security(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => ManiError::Security(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                ManiError::Security(format!("unable to access secure storage: {err}"))
            }
            _ => ManiError::Security(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_mani())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ManiError */
/* -------------------------------------------------------------------------- */

impl IntoManiError for HttpError {
    fn into_mani(self) -> ManiError {
        if self.is_timeout() {
            return ManiError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ManiError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_decode() {
            return ManiError::Network(format!("HTTP response body could not be decoded: {self}"));
        }

        if self.is_builder() {
            return ManiError::InvalidInput(format!("HTTP request could not be built: {self}"));
        }

        ManiError::Network(format!("HTTP transport error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_mani())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn keyring_no_entry_maps_to_not_found() {
        let mapped: ManiError = InfraError::from(KeyringError::NoEntry).into();
        match mapped {
            ManiError::NotFound(msg) => assert!(msg.contains("keychain")),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn keyring_too_long_maps_to_security() {
        let mapped: ManiError =
            InfraError::from(KeyringError::TooLong("service".into(), 64)).into();
        assert!(matches!(mapped, ManiError::Security(msg) if msg.contains("64")));
    }

    #[tokio::test]
    async fn status_errors_are_not_classified_as_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        // Statuses are classified by the API client, never by the transport
        let mapped: ManiError = InfraError::from(error).into();
        assert!(matches!(mapped, ManiError::Network(msg) if msg.contains("transport error")));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: ManiError = InfraError::from(error).into();
        assert!(matches!(mapped, ManiError::Network(msg) if msg.contains("connection")));
    }
}
