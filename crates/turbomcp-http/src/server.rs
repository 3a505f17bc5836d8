//! Server-role HTTP transport: one streamable-HTTP endpoint over axum.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes as AxumBytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};
use turbomcp_core::{Frame, RpcError};
use turbomcp_transport_traits::{SessionDirectory, SessionId, Transport, TransportError, TransportHandler};

use crate::config::HttpServerConfig;

const SESSION_HEADER: &str = "mcp-session-id";

type ResponseChannels = DashMap<SessionId, mpsc::Sender<Result<Event, Infallible>>>;

#[derive(Clone)]
struct ServerState {
    handler: Arc<dyn TransportHandler>,
    sessions: Arc<dyn SessionDirectory>,
    channels: Arc<ResponseChannels>,
    config: Arc<HttpServerConfig>,
}

/// Streamable HTTP transport for the server role.
pub struct HttpServerTransport {
    config: Arc<HttpServerConfig>,
    sessions: Arc<dyn SessionDirectory>,
    channels: Arc<ResponseChannels>,
    running: AtomicBool,
    tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl HttpServerTransport {
    #[must_use]
    pub fn new(config: HttpServerConfig, sessions: Arc<dyn SessionDirectory>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            channels: Arc::new(DashMap::new()),
            running: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn router(&self, handler: Arc<dyn TransportHandler>) -> Router {
        let state = ServerState {
            handler,
            sessions: self.sessions.clone(),
            channels: self.channels.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new().route(
            &self.config.entry_point,
            post(handle_post).delete(handle_delete),
        );

        if state.config.authorization.is_some() {
            router = router
                .route(
                    &self.config.discovery_path(),
                    get(handle_discovery).options(|| async { StatusCode::NO_CONTENT }),
                )
                .layer(CorsLayer::permissive());
        }

        router.with_state(state)
    }
}

#[async_trait]
impl Transport for HttpServerTransport {
    async fn open(&self, handler: Arc<dyn TransportHandler>) -> Result<(), TransportError> {
        self.running.store(true, Ordering::SeqCst);
        let app = self.router(handler);
        let bind_addr = self.config.bind_addr;
        let tls = match (&self.config.cert_file, &self.config.key_file) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => None,
        };

        let server_task = tokio::spawn(async move {
            let result = if let Some((cert, key)) = tls {
                match axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert, &key).await {
                    Ok(tls_config) => {
                        axum_server::bind_rustls(bind_addr, tls_config)
                            .serve(app.into_make_service())
                            .await
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load TLS certificate/key");
                        return;
                    }
                }
            } else {
                match tokio::net::TcpListener::bind(bind_addr).await {
                    Ok(listener) => axum::serve(listener, app).await,
                    Err(e) => {
                        warn!(error = %e, "failed to bind HTTP listener");
                        return;
                    }
                }
            };
            if let Err(e) = result {
                warn!(error = %e, "HTTP server task ended with an error");
            }
        });

        let sessions = self.sessions.clone();
        let session_timeout = self.config.session_timeout;
        let sweeper_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(session_timeout);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                interval.tick().await;
                sessions.sweep_tick().await;
            }
        });

        *self.tasks.lock().await = vec![server_task, sweeper_task];
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.running.store(false, Ordering::SeqCst);
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        Ok(())
    }

    async fn poll(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        true
    }

    async fn emit(
        &self,
        session: &SessionId,
        payload: Bytes,
        is_final: bool,
    ) -> Result<(), TransportError> {
        let entry = if is_final {
            self.channels.remove(session).map(|(_, tx)| tx)
        } else {
            self.channels.get(session).map(|tx| tx.clone())
        };

        let Some(tx) = entry else {
            return Err(TransportError::UnknownSession(session.to_string()));
        };

        let text = String::from_utf8_lossy(&payload).into_owned();
        let event = Event::default().event("message").data(text);
        tx.send(Ok(event))
            .await
            .map_err(|_| TransportError::Closed)
    }
}

async fn handle_post(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: AxumBytes,
) -> Response {
    if let Some(auth) = &state.config.authorization {
        if let Err(response) = check_bearer(&headers, auth, &state.config) {
            return response;
        }
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return one_shot_sse(Frame::error(None, RpcError::parse_error())),
    };
    let frame = match Frame::from_value(value) {
        Ok(f) => f,
        Err(e) => return one_shot_sse(Frame::error(None, e)),
    };

    let header_session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(SessionId::from);

    let is_initialize = matches!(&frame, Frame::Request { method, .. } if method == "initialize");

    let session_id = if is_initialize {
        SessionId::generate()
    } else {
        match header_session {
            Some(id) => id,
            None => return (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id").into_response(),
        }
    };

    if !is_initialize && !state.sessions.contains(&session_id).await {
        return (StatusCode::BAD_REQUEST, "unknown session").into_response();
    }
    if !is_initialize {
        state.sessions.touch(&session_id).await;
    }

    match frame {
        Frame::Notification { .. } => {
            state.handler.on_recv(&session_id, body.into()).await;
            let mut response = StatusCode::ACCEPTED.into_response();
            insert_session_header(response.headers_mut(), &session_id);
            response
        }
        Frame::Request { .. } => {
            let (tx, rx) = mpsc::channel(32);
            state.channels.insert(session_id.clone(), tx);

            let handler = state.handler.clone();
            let channels = state.channels.clone();
            let dispatch_session = session_id.clone();
            tokio::spawn(async move {
                handler.on_recv(&dispatch_session, body.into()).await;
                // Safety net: a handler that never emits a final frame would
                // otherwise leave the SSE stream open forever.
                channels.remove(&dispatch_session);
            });

            let stream = ReceiverStream::new(rx);
            let sse = Sse::new(stream).keep_alive(KeepAlive::default());
            let mut response = sse.into_response();
            insert_session_header(response.headers_mut(), &session_id);
            response
        }
        Frame::Response { id, .. } => {
            one_shot_sse(Frame::error(Some(id), RpcError::invalid_request()))
        }
        Frame::Error { id, .. } => one_shot_sse(Frame::error(id, RpcError::invalid_request())),
    }
}

async fn handle_delete(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    let Some(session_id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(SessionId::from)
    else {
        return (StatusCode::BAD_REQUEST, "missing Mcp-Session-Id").into_response();
    };
    state.sessions.terminate(&session_id).await;
    state.channels.remove(&session_id);
    StatusCode::OK.into_response()
}

async fn handle_discovery(State(state): State<ServerState>) -> Response {
    let Some(auth) = &state.config.authorization else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let body = serde_json::json!({
        "resource": auth.discovery.resource,
        "authorization_servers": auth.discovery.authorization_servers,
        "scopes_supported": auth.discovery.scopes_supported,
        "bearer_methods_supported": ["header"],
    });
    axum::Json(body).into_response()
}

fn check_bearer(
    headers: &HeaderMap,
    auth: &crate::config::HttpAuthorization,
    config: &HttpServerConfig,
) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let valid = token.is_some_and(|t| auth.validator.validate(t).is_ok());
    if valid {
        return Ok(());
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = if config.cert_file.is_some() {
        "https"
    } else {
        "http"
    };
    let resource_metadata = format!("{scheme}://{host}{}", config.discovery_path());
    debug!(%resource_metadata, "rejecting POST without a valid bearer token");

    let mut response = StatusCode::UNAUTHORIZED.into_response();
    let value = HeaderValue::from_str(&format!(
        "Bearer resource_metadata=\"{resource_metadata}\""
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, value);
    Err(response)
}

fn insert_session_header(headers: &mut HeaderMap, session: &SessionId) {
    if let Ok(value) = HeaderValue::from_str(session.as_str()) {
        headers.insert(HeaderName::from_static(SESSION_HEADER), value);
    }
}

fn one_shot_sse(frame: Frame) -> Response {
    let (tx, rx) = mpsc::channel(1);
    let event = Event::default().event("message").data(String::from_utf8_lossy(&frame.to_bytes()).into_owned());
    let _ = tx.try_send(Ok::<_, Infallible>(event));
    drop(tx);
    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    struct AlwaysKnown;

    #[async_trait]
    impl SessionDirectory for AlwaysKnown {
        async fn contains(&self, _session: &SessionId) -> bool {
            true
        }
        async fn touch(&self, _session: &SessionId) {}
        async fn terminate(&self, _session: &SessionId) {}
        async fn sweep_tick(&self) {}
    }

    #[tokio::test]
    async fn emit_on_unregistered_session_is_rejected() {
        let config = HttpServerConfig::new("127.0.0.1:0".parse::<SocketAddr>().unwrap());
        let transport = HttpServerTransport::new(config, Arc::new(AlwaysKnown));
        let err = transport
            .emit(&SessionId::generate(), Bytes::from_static(b"{}"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn not_running_before_open() {
        let config = HttpServerConfig::new("127.0.0.1:0".parse::<SocketAddr>().unwrap());
        let transport = HttpServerTransport::new(config, Arc::new(AlwaysKnown));
        assert!(!transport.poll().await);
    }
}
