//! The protocol dispatcher: the fixed method table driving every incoming
//! request, and the `TransportHandler` seam that wires it to a transport.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};
use turbomcp_core::{Frame, RequestId, RpcError};
use turbomcp_transport_traits::{SessionId, Transport, TransportHandler};
use turbomcp_types::{Tool, ToolDescriptor, ToolInvocation};

use crate::session::SessionRegistry;
use crate::tools::{ToolRegistry, TransportSink, validate_arguments};

const PROTOCOL_VERSION: &str = "2025-06-18";

/// Identifies this server in `initialize`'s `serverInfo`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Routes incoming frames to the fixed method table, correlating each
/// session's in-flight request id with its handler-emitted notifications
/// and final response.
///
/// `transport` is bound after construction via [`Dispatcher::bind_transport`]
/// rather than taken in `new`, since the concrete `Transport` and the
/// `Dispatcher` (itself the transport's `TransportHandler`) are naturally
/// circular: the runtime builds both, then ties the knot once. A `Dispatcher`
/// and a `Transport` both live exactly as long as the server process, so the
/// resulting `Arc` cycle never needs to be broken — there is no server
/// teardown path in this runtime shorter than process exit.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionRegistry>,
    server_info: ServerInfo,
    transport: OnceLock<Arc<dyn Transport>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, sessions: Arc<SessionRegistry>, server_info: ServerInfo) -> Self {
        Self {
            registry,
            sessions,
            server_info,
            transport: OnceLock::new(),
        }
    }

    /// Tie the knot: give the dispatcher the transport it emits responses
    /// through. Must be called once, before `transport.open` starts
    /// delivering frames.
    pub fn bind_transport(&self, transport: Arc<dyn Transport>) {
        let _ = self.transport.set(transport);
    }

    fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.get()
    }

    async fn emit_response(&self, session: &SessionId, id: RequestId, result: Value) {
        let Some(transport) = self.transport() else {
            warn!("dispatcher has no bound transport, dropping response");
            return;
        };
        let frame = Frame::response(id, result);
        if let Err(e) = transport.emit(session, frame.to_bytes().into(), true).await {
            warn!(session = %session, error = %e, "failed to emit response");
        }
    }

    async fn emit_error(&self, session: &SessionId, id: Option<RequestId>, error: RpcError) {
        let Some(transport) = self.transport() else {
            warn!("dispatcher has no bound transport, dropping error response");
            return;
        };
        let frame = Frame::error(id, error);
        if let Err(e) = transport.emit(session, frame.to_bytes().into(), true).await {
            warn!(session = %session, error = %e, "failed to emit error response");
        }
    }

    async fn dispatch_request(&self, session: &SessionId, id: RequestId, method: &str, params: Option<Value>) {
        let record = self.sessions.create_with_id(session.clone());
        *record.current_request_id.lock().await = Some(id.clone());

        match method {
            "initialize" => {
                let result = serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"logging": {}, "tools": {}},
                    "serverInfo": {"name": self.server_info.name, "version": self.server_info.version},
                });
                self.emit_response(session, id, result).await;
                *record.current_request_id.lock().await = None;
            }
            "ping" => {
                self.emit_response(session, id, serde_json::json!({})).await;
                *record.current_request_id.lock().await = None;
            }
            "logging/setLevel" => {
                self.emit_response(session, id, serde_json::json!({})).await;
                *record.current_request_id.lock().await = None;
            }
            "tools/list" => {
                let tools: Vec<Value> = self
                    .registry
                    .iter()
                    .map(|entry| ToolDescriptor::from_tool(entry.value()).to_wire_json())
                    .collect();
                self.emit_response(session, id, serde_json::json!({"tools": tools})).await;
                *record.current_request_id.lock().await = None;
            }
            "tools/call" => {
                self.dispatch_tool_call(session, id, params, record).await;
            }
            other => {
                self.emit_error(session, Some(id), RpcError::method_not_found(other)).await;
                *record.current_request_id.lock().await = None;
            }
        }
    }

    async fn dispatch_tool_call(
        &self,
        session: &SessionId,
        id: RequestId,
        params: Option<Value>,
        record: Arc<crate::session::Session>,
    ) {
        let params = params.unwrap_or_default();
        let name = params.get("name").and_then(Value::as_str).unwrap_or_default();

        let Some(tool_entry) = self.registry.get(name) else {
            self.emit_error(
                session,
                Some(id),
                RpcError::invalid_params(format!("Unknown tool: {name}")),
            )
            .await;
            *record.current_request_id.lock().await = None;
            return;
        };
        let tool: Tool = tool_entry.value().clone();
        drop(tool_entry);

        let empty = Map::new();
        let arguments = params
            .get("arguments")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let resolved = match validate_arguments(&tool, arguments) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.emit_error(session, Some(id), e).await;
                *record.current_request_id.lock().await = None;
                return;
            }
        };

        let Some(transport) = self.transport().cloned() else {
            warn!("dispatcher has no bound transport, cannot invoke tool handler");
            *record.current_request_id.lock().await = None;
            return;
        };

        let sink = Arc::new(TransportSink::new(session.clone(), id, transport, record));
        let invocation = ToolInvocation {
            arguments: resolved,
            session_id: session.as_str().into(),
            sink,
        };

        let handler = tool.handler.clone();
        tokio::spawn(async move {
            (handler)(invocation).await;
        });
    }
}

#[async_trait]
impl TransportHandler for Dispatcher {
    async fn on_recv(&self, session: &SessionId, frame: Bytes) {
        let parsed = Frame::parse(&frame);
        trace!(session = %session, "dispatcher: received frame");

        match parsed {
            Ok(Frame::Request { id, method, params }) => {
                self.dispatch_request(session, id, &method, params).await;
            }
            Ok(Frame::Notification { method, .. }) => {
                debug!(session = %session, %method, "dispatcher: consuming notification");
            }
            Ok(Frame::Response { id, .. }) => {
                warn!(session = %session, ?id, "dispatcher: dropping unexpected client response frame");
            }
            Ok(Frame::Error { .. }) => {
                warn!(session = %session, "dispatcher: dropping unexpected client error frame");
            }
            Err(error) => {
                self.emit_error(session, None, error).await;
            }
        }
    }

    async fn on_close(&self, session: &SessionId) {
        self.sessions.erase(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_info_holds_name_and_version() {
        let info = ServerInfo::new("time-server", "0.1.0");
        assert_eq!(info.name, "time-server");
        assert_eq!(info.version, "0.1.0");
    }
}
