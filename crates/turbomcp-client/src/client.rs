//! The `Client` facade: `initialize`, `tools_list`, `tools_call` over
//! whichever transport it was built with.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use turbomcp_core::{Frame, RequestId};
use turbomcp_types::ToolDescriptor;

use crate::error::ClientError;
use crate::transport::ClientTransport;

const PROTOCOL_VERSION: &str = "2025-06-18";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// `serverInfo` as returned by `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// The parsed result of a successful `initialize` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: ServerInfo,
}

impl InitializeResult {
    fn from_wire(value: &Value) -> Self {
        let protocol_version = value
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let server_info = value.get("serverInfo");
        let name = server_info
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = server_info
            .and_then(|s| s.get("version"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            protocol_version,
            server_info: ServerInfo { name, version },
        }
    }
}

/// An MCP client bound to one transport for its whole lifetime.
///
/// Request ids are `AtomicI64`, starting at 1 and monotonically increasing
/// for as long as this instance lives — never reset per call.
pub struct Client {
    name: String,
    version: String,
    next_id: AtomicI64,
    transport: ClientTransport,
    request_timeout: Duration,
}

impl Client {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, transport: impl Into<ClientTransport>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            next_id: AtomicI64::new(1),
            transport: transport.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the deadline `tools_call`/`tools_list`/`initialize` wait for
    /// a reply before failing with [`ClientError::Timeout`].
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn next_request_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send `initialize`, then emit `notifications/initialized` once the
    /// server has replied.
    pub async fn initialize(&self) -> Result<InitializeResult, ClientError> {
        let id = self.next_request_id();
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": self.name, "version": self.version},
        });
        let result = self.call(id, "initialize", Some(params)).await?;
        self.send_notification("notifications/initialized", None).await?;
        Ok(InitializeResult::from_wire(&result))
    }

    /// Issue `tools/list` and parse the returned schemas back into
    /// [`ToolDescriptor`] records.
    pub async fn tools_list(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let id = self.next_request_id();
        let result = self.call(id, "tools/list", None).await?;
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(tools.iter().filter_map(ToolDescriptor::from_wire_json).collect())
    }

    /// Issue `tools/call`, streaming `notifications/<name>` frames to
    /// `on_notification` until the final response arrives. Once the
    /// callback returns `false`, later notifications for this call are
    /// still drained but never passed to it again.
    pub async fn tools_call(
        &self,
        name: &str,
        arguments: Value,
        mut on_notification: impl FnMut(&str, &Value) -> bool,
    ) -> Result<Value, ClientError> {
        let id = self.next_request_id();
        let params = serde_json::json!({"name": name, "arguments": arguments});
        self.call_streaming(id, "tools/call", Some(params), &mut on_notification)
            .await
    }

    /// Close the underlying transport.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        self.transport.shutdown().await.map_err(ClientError::Transport)
    }

    async fn call(&self, id: i64, method: &str, params: Option<Value>) -> Result<Value, ClientError> {
        self.call_streaming(id, method, params, &mut |_, _| true).await
    }

    async fn call_streaming(
        &self,
        id: i64,
        method: &str,
        params: Option<Value>,
        on_notification: &mut dyn FnMut(&str, &Value) -> bool,
    ) -> Result<Value, ClientError> {
        let frame = Frame::request(id, method, params);
        self.transport
            .send(Bytes::from(frame.to_bytes()))
            .await
            .map_err(ClientError::Transport)?;

        let target = RequestId::Number(id);
        let mut streaming_done = false;

        loop {
            let Some(bytes) = self
                .transport
                .recv(self.request_timeout)
                .await
                .map_err(ClientError::Transport)?
            else {
                return Err(ClientError::Timeout);
            };

            match Frame::parse(&bytes) {
                Ok(Frame::Response { id: rid, result }) if rid == target => return Ok(result),
                Ok(Frame::Error { id: rid, error }) if rid.as_ref() == Some(&target) => {
                    return Err(ClientError::Server(error));
                }
                Ok(Frame::Notification { method, params }) => {
                    if !streaming_done {
                        let keep_going = on_notification(&method, &params.unwrap_or(Value::Null));
                        streaming_done = !keep_going;
                    }
                }
                Ok(other) => {
                    tracing::warn!(?other, "client: dropping frame not addressed to this call");
                }
                Err(error) => return Err(ClientError::MalformedFrame(error)),
            }
        }
    }

    async fn send_notification(&self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let frame = Frame::notification(method, params);
        self.transport
            .send(Bytes::from(frame.to_bytes()))
            .await
            .map_err(ClientError::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_result_parses_protocol_version_and_server_info() {
        let wire = serde_json::json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {"logging": {}, "tools": {}},
            "serverInfo": {"name": "time-server", "version": "0.1.0"},
        });
        let result = InitializeResult::from_wire(&wire);
        assert_eq!(result.protocol_version, "2025-06-18");
        assert_eq!(result.server_info.name, "time-server");
        assert_eq!(result.server_info.version, "0.1.0");
    }

    #[test]
    fn request_ids_increment_monotonically_from_one() {
        let next_id = AtomicI64::new(1);
        assert_eq!(next_id.fetch_add(1, Ordering::SeqCst), 1);
        assert_eq!(next_id.fetch_add(1, Ordering::SeqCst), 2);
        assert_eq!(next_id.load(Ordering::SeqCst), 3);
    }
}
