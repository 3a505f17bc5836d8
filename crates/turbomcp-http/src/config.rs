//! HTTP transport configuration, both roles.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use turbomcp_auth::{AuthorizationConfig, BearerValidator};
use url::Url;

const DEFAULT_CLIENT_NAME: &str = "turbomcp-client";
const DEFAULT_LOOPBACK_PORT: u16 = 0;

/// Default number of sweeper ticks a session survives without activity
/// before eviction.
pub const DEFAULT_TICKS_BEFORE_EVICT: u32 = 2;

/// Server-role HTTP transport configuration.
#[derive(Clone)]
pub struct HttpServerConfig {
    pub bind_addr: SocketAddr,
    /// URL path the tool endpoint is mounted at, e.g. `/mcp`.
    pub entry_point: String,
    /// Interval between sweeper ticks.
    pub session_timeout: Duration,
    /// Liveness counter a fresh/touched session starts at.
    pub ticks_before_evict: u32,
    /// When set, every POST must carry a valid bearer token for this
    /// audience and the discovery endpoint is mounted.
    pub authorization: Option<HttpAuthorization>,
    /// TLS certificate/key pair; when both are set, the server speaks
    /// HTTPS via `axum-server`'s rustls integration.
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

/// Bundles the discovery document source with the validator it backs.
#[derive(Clone)]
pub struct HttpAuthorization {
    pub discovery: AuthorizationConfig,
    pub validator: Arc<BearerValidator>,
}

impl HttpServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            entry_point: "/mcp".to_string(),
            session_timeout: Duration::from_secs(30),
            ticks_before_evict: DEFAULT_TICKS_BEFORE_EVICT,
            authorization: None,
            cert_file: None,
            key_file: None,
        }
    }

    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    #[must_use]
    pub fn with_authorization(mut self, authorization: HttpAuthorization) -> Self {
        self.authorization = Some(authorization);
        self
    }

    #[must_use]
    pub fn with_tls(mut self, cert_file: PathBuf, key_file: PathBuf) -> Self {
        self.cert_file = Some(cert_file);
        self.key_file = Some(key_file);
        self
    }

    #[must_use]
    pub fn discovery_path(&self) -> String {
        format!("/.well-known/oauth-protected-resource{}", self.entry_point)
    }
}

/// Client-role HTTP transport configuration.
#[derive(Clone)]
pub struct HttpClientConfig {
    pub base_url: Url,
    pub entry_point: String,
    pub request_timeout: Duration,
    /// Pre-registered OAuth client id. `None` triggers dynamic client
    /// registration the first time a 401 is seen.
    pub client_id: Option<String>,
    /// `client_name` presented during dynamic client registration.
    pub client_name: String,
    /// Loopback port the authorization redirect listens on; `0` lets the OS
    /// pick a free port.
    pub loopback_port: u16,
    /// How long to wait for the user to complete the browser authorization
    /// step before giving up.
    pub auth_timeout: Duration,
}

impl HttpClientConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            entry_point: "/mcp".to_string(),
            request_timeout: Duration::from_secs(60),
            client_id: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            loopback_port: DEFAULT_LOOPBACK_PORT,
            auth_timeout: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub(crate) fn endpoint_url(&self) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&self.entry_point);
        url
    }
}
