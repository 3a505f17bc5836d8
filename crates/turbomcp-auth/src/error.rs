//! Authorization error taxonomy.

use thiserror::Error;

/// Errors surfaced by the client-side authorization flow and the
/// server-side bearer validator.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Any failure during discovery, registration, PKCE, the loopback
    /// callback, or token exchange collapses into this single variant —
    /// intermediate causes are logged at `debug`, never echoed to the
    /// caller.
    #[error("authorization handshake failed: {0}")]
    HandshakeFailed(String),

    /// A presented bearer token failed validation.
    #[error("bearer token rejected: {0}")]
    TokenRejected(String),
}
