//! Server-side session records and the registry that owns them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use turbomcp_core::RequestId;
use turbomcp_transport_traits::{SessionDirectory, SessionId};

/// One server-side session: bound at `initialize`, torn down on `DELETE`,
/// transport close, or sweeper timeout.
pub struct Session {
    pub id: SessionId,
    /// Sweeper ticks remaining before eviction; reset by every touch.
    liveness: AtomicU32,
    /// The JSON-RPC id of the request currently in flight on this session,
    /// if any. Set at dispatch-start, cleared once the handler finishes.
    pub current_request_id: Mutex<Option<RequestId>>,
}

impl Session {
    fn new(id: SessionId, ticks_before_evict: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            liveness: AtomicU32::new(ticks_before_evict),
            current_request_id: Mutex::new(None),
        })
    }
}

/// The concurrent session table. One instance is shared between the
/// dispatcher (which creates/erases sessions and reads `current_request_id`)
/// and the HTTP transport (via the narrower [`SessionDirectory`] seam, so
/// `turbomcp-http` never depends on this crate).
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    ticks_before_evict: u32,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(ticks_before_evict: u32) -> Self {
        Self {
            sessions: DashMap::new(),
            ticks_before_evict,
        }
    }

    /// Create and register a session under a freshly generated id.
    #[must_use]
    pub fn create(&self) -> Arc<Session> {
        self.create_with_id(SessionId::generate())
    }

    /// Register `id` if it isn't already known, returning the (possibly
    /// pre-existing) record. Idempotent so the HTTP transport, which mints
    /// the id itself for `initialize`, and the stdio transport, which
    /// pre-registers its single root session, both just call this.
    #[must_use]
    pub fn create_with_id(&self, id: SessionId) -> Arc<Session> {
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id, self.ticks_before_evict))
            .clone()
    }

    #[must_use]
    pub fn find(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    pub fn erase(&self, id: &SessionId) {
        self.sessions.remove(id);
    }
}

#[async_trait]
impl SessionDirectory for SessionRegistry {
    async fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    async fn touch(&self, session: &SessionId) {
        if let Some(entry) = self.sessions.get(session) {
            entry.liveness.store(self.ticks_before_evict, Ordering::SeqCst);
        }
    }

    async fn terminate(&self, session: &SessionId) {
        self.erase(session);
    }

    async fn sweep_tick(&self) {
        let mut evicted = Vec::new();
        for entry in self.sessions.iter() {
            let remaining = entry.liveness.fetch_sub(1, Ordering::SeqCst);
            if remaining <= 1 {
                evicted.push(entry.key().clone());
            }
        }
        for id in evicted {
            debug!(session = %id, "sweeper: evicting idle session");
            self.sessions.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn touch_resets_liveness_so_session_survives_a_sweep() {
        let registry = SessionRegistry::new(2);
        let session = registry.create();
        registry.sweep_tick().await; // 2 -> 1
        registry.touch(&session.id).await; // reset to 2
        registry.sweep_tick().await; // 2 -> 1
        assert!(registry.contains(&session.id).await);
    }

    #[tokio::test]
    async fn untouched_session_is_evicted_after_two_ticks() {
        let registry = SessionRegistry::new(2);
        let session = registry.create();
        registry.sweep_tick().await; // 2 -> 1
        assert!(registry.contains(&session.id).await);
        registry.sweep_tick().await; // 1 -> 0, evicted
        assert!(!registry.contains(&session.id).await);
    }

    #[tokio::test]
    async fn create_with_id_is_idempotent() {
        let registry = SessionRegistry::new(2);
        let id = SessionId::from("root-ish");
        let a = registry.create_with_id(id.clone());
        let b = registry.create_with_id(id);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn terminate_removes_the_session() {
        let registry = SessionRegistry::new(2);
        let session = registry.create();
        registry.terminate(&session.id).await;
        assert!(!registry.contains(&session.id).await);
    }
}
