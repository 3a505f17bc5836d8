//! Client-role HTTP transport: one streamable-HTTP endpoint, reqwest-driven.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client as HttpClient, StatusCode, header};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use turbomcp_auth::{AccessToken, AuthorizationRequest};
use turbomcp_transport_traits::TransportError;
use url::Url;

use crate::config::HttpClientConfig;

const SESSION_HEADER: &str = "mcp-session-id";

/// A client-side connection to one MCP streamable-HTTP endpoint.
///
/// `send`/`recv` mirror [`turbomcp_stdio::client::StdioClientTransport`]'s
/// shape: writes go straight out, and every frame the server emits —
/// whether a single JSON body or an SSE stream's `data:` lines — lands in
/// one shared queue that `recv` drains.
pub struct HttpClientTransport {
    config: HttpClientConfig,
    http: HttpClient,
    session_id: Mutex<Option<String>>,
    bearer_token: Mutex<Option<String>>,
    rx: Mutex<mpsc::Receiver<Bytes>>,
    tx: mpsc::Sender<Bytes>,
}

impl HttpClientTransport {
    /// Build a transport against `config`. No network activity happens
    /// until the first [`Self::send`].
    #[must_use]
    pub fn new(config: HttpClientConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client configuration is always valid here");
        let (tx, rx) = mpsc::channel(256);
        Self {
            config,
            http,
            session_id: Mutex::new(None),
            bearer_token: Mutex::new(None),
            rx: Mutex::new(rx),
            tx,
        }
    }

    /// POST one frame to the server. A JSON-RPC notification reply (HTTP
    /// 202, no body) queues nothing; a request reply queues one or more
    /// frames for [`Self::recv`] to pick up.
    pub async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        match self.send_once(payload.clone()).await {
            Err(TransportError::Unauthorized(resource_metadata_url)) => {
                self.authorize(&resource_metadata_url).await?;
                self.send_once(payload).await
            }
            other => other,
        }
    }

    async fn send_once(&self, payload: Bytes) -> Result<(), TransportError> {
        let url = self.config.endpoint_url();
        let mut request = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json, text/event-stream")
            .body(payload.to_vec());

        if let Some(session) = self.session_id.lock().await.clone() {
            request = request.header(SESSION_HEADER, session);
        }
        if let Some(token) = self.bearer_token.lock().await.clone() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let resource_metadata_url = response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_resource_metadata)
                .unwrap_or_default();
            return Err(TransportError::Unauthorized(resource_metadata_url));
        }

        if !response.status().is_success() {
            return Err(TransportError::Io(format!(
                "POST {} failed: {}",
                self.config.endpoint_url(),
                response.status()
            )));
        }

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock().await = Some(session.to_string());
        }

        if response.status() == StatusCode::ACCEPTED {
            return Ok(());
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("text/event-stream") {
            // Spawned rather than awaited inline: progress notifications must
            // reach `recv` as the server flushes each one, not only once the
            // whole response closes.
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let mut stream = response.bytes_stream();
                let mut buffer = String::new();

                while let Some(chunk) = stream.next().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            warn!(error = %e, "http client: SSE stream read error");
                            break;
                        }
                    };
                    buffer.push_str(&String::from_utf8_lossy(&chunk));

                    while let Some(pos) = buffer.find("\n\n") {
                        let event = buffer[..pos].to_string();
                        buffer.drain(..pos + 2);
                        if let Some(frame) = sse_event_data(&event) {
                            if tx.send(frame).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        } else {
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Io(e.to_string()))?;
            if self.tx.send(body).await.is_err() {
                return Err(TransportError::Closed);
            }
        }

        Ok(())
    }

    async fn authorize(&self, resource_metadata_url: &str) -> Result<(), TransportError> {
        let url = Url::parse(resource_metadata_url)
            .map_err(|e| TransportError::Unauthorized(format!("bad resource_metadata url: {e}")))?;
        let request = AuthorizationRequest {
            resource_metadata_url: url,
            client_id: self.config.client_id.clone(),
            client_name: self.config.client_name.clone(),
            loopback_port: self.config.loopback_port,
            timeout: self.config.auth_timeout,
            open_url: None,
        };
        let AccessToken { token } = turbomcp_auth::authorize(request)
            .await
            .map_err(|e| TransportError::Unauthorized(e.to_string()))?;
        *self.bearer_token.lock().await = Some(token);
        Ok(())
    }

    /// Wait up to `timeout` for the next queued frame; `Ok(None)` on timeout.
    pub async fn recv(&self, timeout: Duration) -> Result<Option<Bytes>, TransportError> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(bytes)) => Ok(Some(bytes)),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    /// Terminate the session with an HTTP `DELETE`, best-effort.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        let Some(session) = self.session_id.lock().await.clone() else {
            return Ok(());
        };
        let url = self.config.endpoint_url();
        if let Err(e) = self
            .http
            .delete(url)
            .header(SESSION_HEADER, session)
            .send()
            .await
        {
            debug!(error = %e, "DELETE during shutdown failed, ignoring");
        }
        Ok(())
    }
}

/// `WWW-Authenticate: Bearer resource_metadata="https://..."` → the URL.
fn extract_resource_metadata(header_value: &str) -> Option<String> {
    let marker = "resource_metadata=\"";
    let start = header_value.find(marker)? + marker.len();
    let rest = &header_value[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Pull one SSE event's concatenated `data:` payload, if it carries one.
/// `event` is the text between two `\n\n` boundaries, as handed out by the
/// incremental scanner in [`HttpClientTransport::send_once`].
fn sse_event_data(event: &str) -> Option<Bytes> {
    let mut data_lines = Vec::new();
    for line in event.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim_start());
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    let joined = data_lines.join("\n");
    if joined.trim().is_empty() {
        return None;
    }
    Some(Bytes::copy_from_slice(joined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_resource_metadata_from_www_authenticate() {
        let header = r#"Bearer resource_metadata="https://mcp.example.com/.well-known/oauth-protected-resource/mcp""#;
        assert_eq!(
            extract_resource_metadata(header).as_deref(),
            Some("https://mcp.example.com/.well-known/oauth-protected-resource/mcp")
        );
    }

    #[test]
    fn missing_resource_metadata_is_none() {
        assert_eq!(extract_resource_metadata("Bearer"), None);
    }

    #[test]
    fn single_event_single_data_line() {
        let event = "event: message\ndata: {\"ok\":true}";
        let frame = sse_event_data(event).unwrap();
        assert_eq!(frame.as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn multi_line_data_is_newline_joined() {
        let event = "data: line one\ndata: line two";
        let frame = sse_event_data(event).unwrap();
        assert_eq!(frame.as_ref(), b"line one\nline two");
    }

    #[test]
    fn event_with_no_data_line_yields_none() {
        assert!(sse_event_data("event: ping").is_none());
    }

    #[tokio::test]
    async fn incremental_buffer_splits_multiple_events_from_one_chunk() {
        // Mirrors the scanning loop in `send_once`: a single network chunk
        // can carry more than one complete `\n\n`-terminated event.
        let mut buffer = String::from("data: one\n\ndata: two\n\ndata: partial");
        let mut frames = Vec::new();
        while let Some(pos) = buffer.find("\n\n") {
            let event = buffer[..pos].to_string();
            buffer.drain(..pos + 2);
            if let Some(frame) = sse_event_data(&event) {
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref(), b"one");
        assert_eq!(frames[1].as_ref(), b"two");
        assert_eq!(buffer, "data: partial");
    }

    #[tokio::test]
    async fn recv_times_out_when_nothing_queued() {
        let config = HttpClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
        let transport = HttpClientTransport::new(config);
        let result = transport.recv(Duration::from_millis(50)).await.unwrap();
        assert!(result.is_none());
    }
}
