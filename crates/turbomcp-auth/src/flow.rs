//! Client-side authorization code flow with PKCE and dynamic client
//! registration, orchestrating discovery → registration → PKCE →
//! loopback callback → browser → token exchange.

use std::time::Duration;

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, TokenResponse, TokenUrl,
};
use tracing::debug;
use url::Url;

use crate::dcr::register_client;
use crate::discovery::{AuthorizationServerMetadata, ProtectedResourceMetadata};
use crate::error::AuthError;
use crate::loopback::LoopbackListener;

/// Caller-supplied parameters for one authorization round.
pub struct AuthorizationRequest {
    /// `resource_metadata` value from the server's `WWW-Authenticate` header.
    pub resource_metadata_url: Url,
    /// Pre-registered client id; when absent, dynamic client registration
    /// is attempted against the discovered authorization server.
    pub client_id: Option<String>,
    /// Human-readable name sent during dynamic client registration.
    pub client_name: String,
    /// Loopback port to bind (0 lets the OS choose).
    pub loopback_port: u16,
    /// Deadline for the whole handshake, including the browser round trip.
    pub timeout: Duration,
    /// Overrides the default browser launch (`open::that`); useful in
    /// headless environments or tests.
    pub open_url: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

/// The bearer token obtained from a successful handshake.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
}

/// Run the full authorization code + PKCE handshake described in the
/// authorization subsystem, producing a bearer token or a single
/// aggregate [`AuthError`].
pub async fn authorize(request: AuthorizationRequest) -> Result<AccessToken, AuthError> {
    let http = reqwest::Client::new();

    let resource = ProtectedResourceMetadata::discover(&http, &request.resource_metadata_url)
        .await
        .inspect_err(|e| debug!(error = %e, "protected resource discovery failed"))?;

    let as_metadata = AuthorizationServerMetadata::discover_first(
        &http,
        &resource.authorization_servers,
    )
    .await
    .inspect_err(|e| debug!(error = %e, "authorization server discovery failed"))?;

    let csrf_token = CsrfToken::new_random();
    let loopback = LoopbackListener::bind(request.loopback_port, csrf_token.secret().clone())
        .await
        .inspect_err(|e| debug!(error = %e, "loopback bind failed"))?;
    let redirect_uri = loopback.redirect_uri.clone();

    let (client_id, client_secret) = match request.client_id {
        Some(id) => (id, None),
        None => {
            let registration_endpoint = as_metadata.registration_endpoint.as_ref().ok_or_else(|| {
                AuthError::HandshakeFailed(
                    "no client_id configured and server has no registration_endpoint".into(),
                )
            })?;
            let registered = register_client(
                &http,
                registration_endpoint,
                &redirect_uri,
                &request.client_name,
            )
            .await
            .inspect_err(|e| debug!(error = %e, "dynamic client registration failed"))?;
            (registered.client_id, registered.client_secret)
        }
    };

    let auth_url = AuthUrl::from_url(as_metadata.authorization_endpoint.clone());
    let token_url = TokenUrl::from_url(as_metadata.token_endpoint.clone());
    let mut oauth_client = BasicClient::new(ClientId::new(client_id))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()));
    if let Some(secret) = client_secret.clone() {
        oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret));
    }

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let state_for_url = CsrfToken::new(csrf_token.secret().clone());
    let (authorize_url, _) = oauth_client
        .authorize_url(|| state_for_url)
        .set_pkce_challenge(pkce_challenge)
        .url();

    match &request.open_url {
        Some(open_url) => open_url(authorize_url.as_str()),
        None => {
            if open::that(authorize_url.as_str()).is_err() {
                debug!(url = %authorize_url, "browser launch failed, printing URL instead");
                println!("Open this URL to authorize: {authorize_url}");
            }
        }
    }

    let code = loopback.wait_for_code(request.timeout).await?;

    let token_response = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.secret().clone()))
        .request_async(&http)
        .await
        .map_err(|e| AuthError::HandshakeFailed(format!("token exchange: {e}")))?;

    Ok(AccessToken {
        token: token_response.access_token().secret().clone(),
    })
}
