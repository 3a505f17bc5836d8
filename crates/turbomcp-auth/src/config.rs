//! Server-side authorization configuration.

use url::Url;

/// Drives both the discovery endpoint's JSON body and the bearer
/// validator's expected audience.
#[derive(Debug, Clone)]
pub struct AuthorizationConfig {
    /// This server's own canonical URL (scheme+host+path), used both as
    /// `resource` in the discovery document and as the expected `aud`.
    pub resource: Url,
    pub authorization_servers: Vec<Url>,
    pub scopes_supported: Vec<String>,
}

impl AuthorizationConfig {
    #[must_use]
    pub fn new(resource: Url, authorization_servers: Vec<Url>) -> Self {
        Self {
            resource,
            authorization_servers,
            scopes_supported: Vec::new(),
        }
    }
}
