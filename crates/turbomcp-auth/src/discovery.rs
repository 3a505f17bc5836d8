//! Protected-resource and authorization-server metadata discovery.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AuthError;

/// `GET <resource_metadata_url>` response, per RFC 9728.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    pub resource: Url,
    pub authorization_servers: Vec<Url>,
    #[serde(default)]
    pub scopes_supported: Vec<String>,
    #[serde(default)]
    pub bearer_methods_supported: Vec<String>,
}

impl ProtectedResourceMetadata {
    /// Fetch and parse the metadata document named by a `WWW-Authenticate:
    /// Bearer resource_metadata="..."` header value.
    pub async fn discover(
        client: &reqwest::Client,
        resource_metadata_url: &Url,
    ) -> Result<Self, AuthError> {
        let response = client
            .get(resource_metadata_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("protected resource fetch: {e}")))?;
        if !response.status().is_success() {
            return Err(AuthError::HandshakeFailed(format!(
                "protected resource metadata returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("protected resource parse: {e}")))
    }
}

/// `<as>/.well-known/oauth-authorization-server` response, per RFC 8414.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub registration_endpoint: Option<Url>,
}

impl AuthorizationServerMetadata {
    /// Query each listed authorization server in turn; the first that
    /// answers `200` with a parseable JSON document wins (spec step 2).
    pub async fn discover_first(
        client: &reqwest::Client,
        servers: &[Url],
    ) -> Result<Self, AuthError> {
        for server in servers {
            let well_known = server
                .join(".well-known/oauth-authorization-server")
                .map_err(|e| AuthError::HandshakeFailed(format!("invalid AS url: {e}")))?;
            let Ok(response) = client.get(well_known).send().await else {
                continue;
            };
            if !response.status().is_success() {
                continue;
            }
            if let Ok(metadata) = response.json::<Self>().await {
                return Ok(metadata);
            }
        }
        Err(AuthError::HandshakeFailed(
            "no authorization server returned usable metadata".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn protected_resource_discovery_parses_the_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-protected-resource"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "resource": server.uri(),
                "authorization_servers": [server.uri()],
                "scopes_supported": ["tools"],
                "bearer_methods_supported": ["header"],
            })))
            .mount(&server)
            .await;

        let url = Url::parse(&format!(
            "{}/.well-known/oauth-protected-resource",
            server.uri()
        ))
        .unwrap();
        let metadata = ProtectedResourceMetadata::discover(&reqwest::Client::new(), &url)
            .await
            .unwrap();
        assert_eq!(metadata.scopes_supported, vec!["tools".to_string()]);
    }

    #[tokio::test]
    async fn authorization_server_discovery_skips_failing_servers() {
        let bad = MockServer::start().await;
        let good = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-authorization-server"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&bad)
            .await;
        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-authorization-server"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": good.uri(),
                "authorization_endpoint": format!("{}/authorize", good.uri()),
                "token_endpoint": format!("{}/token", good.uri()),
                "registration_endpoint": null,
            })))
            .mount(&good)
            .await;

        let bad_url = Url::parse(&format!("{}/", bad.uri())).unwrap();
        let good_url = Url::parse(&format!("{}/", good.uri())).unwrap();
        let metadata =
            AuthorizationServerMetadata::discover_first(&reqwest::Client::new(), &[bad_url, good_url])
                .await
                .unwrap();
        assert_eq!(metadata.issuer, good.uri());
    }
}
