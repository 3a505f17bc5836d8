//! Dynamic client registration (RFC 7591), minimal subset.
//!
//! `oauth2::basic::BasicClient`'s typestate builder doesn't model
//! registration at all, so this issues the POST directly.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AuthError;

#[derive(Debug, Serialize)]
struct RegistrationRequest<'a> {
    redirect_uris: &'a [Url],
    token_endpoint_auth_method: &'static str,
    grant_types: &'static [&'static str],
    response_types: &'static [&'static str],
    client_name: &'a str,
}

/// Result of a successful registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// POST to `registration_endpoint`; requires `201` in response.
pub async fn register_client(
    client: &reqwest::Client,
    registration_endpoint: &Url,
    redirect_uri: &Url,
    client_name: &str,
) -> Result<RegisteredClient, AuthError> {
    let body = RegistrationRequest {
        redirect_uris: std::slice::from_ref(redirect_uri),
        token_endpoint_auth_method: "none",
        grant_types: &["authorization_code", "refresh_token"],
        response_types: &["code"],
        client_name,
    };

    let response = client
        .post(registration_endpoint.clone())
        .json(&body)
        .send()
        .await
        .map_err(|e| AuthError::HandshakeFailed(format!("registration request: {e}")))?;

    if response.status() != reqwest::StatusCode::CREATED {
        return Err(AuthError::HandshakeFailed(format!(
            "registration endpoint returned {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::HandshakeFailed(format!("registration response parse: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn registration_requires_201_and_extracts_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "token_endpoint_auth_method": "none",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "client_id": "generated-client",
                "client_secret": "shh",
            })))
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).unwrap();
        let redirect = Url::parse("http://127.0.0.1:9999/callback").unwrap();
        let registered = register_client(&reqwest::Client::new(), &endpoint, &redirect, "demo")
            .await
            .unwrap();
        assert_eq!(registered.client_id, "generated-client");
        assert_eq!(registered.client_secret.as_deref(), Some("shh"));
    }

    #[tokio::test]
    async fn non_201_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).unwrap();
        let redirect = Url::parse("http://127.0.0.1:9999/callback").unwrap();
        let err = register_client(&reqwest::Client::new(), &endpoint, &redirect, "demo")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::HandshakeFailed(_)));
    }
}
