//! The dispatcher's own error taxonomy, layered on the JSON-RPC error codes.

use thiserror::Error;
use turbomcp_core::RpcError;

/// Failures the dispatcher or runtime can hit outside the JSON-RPC error
/// frame path (those still go out as `RpcError` on the wire).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport error: {0}")]
    Transport(#[from] turbomcp_transport_traits::TransportError),

    #[error("no transport bound to the dispatcher yet")]
    TransportNotBound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<&DispatchError> for RpcError {
    fn from(err: &DispatchError) -> Self {
        RpcError::internal_error(err.to_string())
    }
}
