//! Transport-level failure modes.

/// Errors a [`crate::Transport`] implementation can surface.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport was misconfigured (bad host:port, missing TLS pair, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A frame exceeded the transport's configured size limit.
    #[error("message too large: {size} bytes exceeds limit of {limit} bytes")]
    MessageTooLarge {
        /// Observed frame size, in bytes.
        size: usize,
        /// Configured limit, in bytes.
        limit: usize,
    },

    /// The session named in the call is not open.
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// The underlying I/O failed.
    #[error("io error: {0}")]
    Io(String),

    /// The transport is already closed.
    #[error("transport closed")]
    Closed,

    /// The server rejected the request for lack of (or an expired) bearer
    /// token, even after the client attempted the authorization handshake.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}
