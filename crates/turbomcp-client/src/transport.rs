//! The client-side transport sum type: stdio or HTTP behind one narrow
//! send/recv interface. Not modeled as a trait object — a capability set
//! this small is better served by an enum than by dynamic dispatch.

use std::time::Duration;

use bytes::Bytes;
use turbomcp_http::HttpClientTransport;
use turbomcp_stdio::StdioClientTransport;
use turbomcp_transport_traits::TransportError;

/// Which concrete client transport a [`crate::Client`] is driving.
pub enum ClientTransport {
    Stdio(StdioClientTransport),
    Http(HttpClientTransport),
}

impl ClientTransport {
    pub(crate) async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        match self {
            Self::Stdio(t) => t.send(payload).await,
            Self::Http(t) => t.send(payload).await,
        }
    }

    pub(crate) async fn recv(&self, timeout: Duration) -> Result<Option<Bytes>, TransportError> {
        match self {
            Self::Stdio(t) => t.recv(timeout).await,
            Self::Http(t) => t.recv(timeout).await,
        }
    }

    pub(crate) async fn shutdown(&self) -> Result<(), TransportError> {
        match self {
            Self::Stdio(t) => t.shutdown().await,
            Self::Http(t) => t.shutdown().await,
        }
    }
}

impl From<StdioClientTransport> for ClientTransport {
    fn from(transport: StdioClientTransport) -> Self {
        Self::Stdio(transport)
    }
}

impl From<HttpClientTransport> for ClientTransport {
    fn from(transport: HttpClientTransport) -> Self {
        Self::Http(transport)
    }
}
