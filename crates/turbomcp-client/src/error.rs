//! Client-facing error type: every failure surfaces as one of these, never
//! a bare transport or JSON-RPC type.

use turbomcp_core::RpcError;
use turbomcp_transport_traits::TransportError;

/// Why a client call failed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport reported connection loss, EOF, or a timeout.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server replied with a JSON-RPC error frame.
    #[error("server error: {0}")]
    Server(#[from] RpcError),

    /// A frame arrived but was not valid JSON-RPC.
    #[error("malformed frame from server: {0}")]
    MalformedFrame(RpcError),

    /// `tools_call` was issued before `initialize` completed.
    #[error("client is not initialized")]
    NotInitialized,

    /// The request's deadline elapsed with no matching response.
    #[error("timed out waiting for a response")]
    Timeout,
}
