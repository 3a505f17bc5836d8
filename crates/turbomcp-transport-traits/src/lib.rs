//! The abstract transport contract shared by the stdio and HTTP transports.
//!
//! A transport is a capability set — `open`/`close`/`poll`/`emit` — not a
//! class hierarchy. Variants (`Stdio`, `Http`) implement [`Transport`]
//! directly; there is no intermediate base class to extend.

mod error;
mod session;

pub use error::TransportError;
pub use session::SessionId;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// What a transport delivers to the dispatcher above it.
#[async_trait]
pub trait TransportHandler: Send + Sync {
    /// A frame arrived on `session`.
    async fn on_recv(&self, session: &SessionId, frame: Bytes);

    /// The session's underlying connection went away.
    async fn on_close(&self, session: &SessionId);
}

/// The capability set every transport variant implements.
///
/// Contract: every `emit` with `is_final = true` closes the logical
/// response stream for the current request on that session. Within one
/// session, frames MUST be emitted in the order `emit` was called; there is
/// no ordering guarantee across sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start accepting connections/input, dispatching to `handler`.
    async fn open(&self, handler: Arc<dyn TransportHandler>) -> Result<(), TransportError>;

    /// Stop accepting input and release any held resources.
    async fn close(&self) -> Result<(), TransportError>;

    /// Cooperative tick. Returns `false` once the transport is shutting
    /// down and the caller should stop polling.
    async fn poll(&self) -> bool;

    /// Emit one frame on `session`. `is_final` closes that session's
    /// current response stream.
    async fn emit(
        &self,
        session: &SessionId,
        payload: Bytes,
        is_final: bool,
    ) -> Result<(), TransportError>;
}

/// What a multi-session transport needs from the session registry above
/// it, kept as a trait object so `turbomcp-http` never depends on
/// `turbomcp-server` (which depends on `turbomcp-http` to mount it) —
/// only on this crate.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Whether `session` is currently registered.
    async fn contains(&self, session: &SessionId) -> bool;

    /// Reset `session`'s liveness counter; called on every POST.
    async fn touch(&self, session: &SessionId);

    /// Remove `session` immediately (an HTTP `DELETE`).
    async fn terminate(&self, session: &SessionId);

    /// Decrement every session's liveness counter by one tick, evicting
    /// those that reach zero.
    async fn sweep_tick(&self);
}
