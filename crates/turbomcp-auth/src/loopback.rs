//! One-shot loopback redirect listener for the authorization-code callback.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use url::Url;

use crate::error::AuthError;

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

type CodeSender = Mutex<Option<oneshot::Sender<Result<String, String>>>>;

#[derive(Clone)]
struct CallbackState {
    sender: std::sync::Arc<CodeSender>,
    expected_state: std::sync::Arc<str>,
}

/// Bind a loopback listener at `127.0.0.1:<port>` and return the redirect
/// URL to register plus a future that resolves to the authorization code
/// once `/callback` is hit (or the deadline elapses).
pub struct LoopbackListener {
    pub redirect_uri: Url,
    rx: oneshot::Receiver<Result<String, String>>,
    server: tokio::task::JoinHandle<()>,
}

impl LoopbackListener {
    /// Bind on `port` (0 lets the OS choose) and start serving `/callback`.
    /// `expected_state` is checked against the callback's `state` query
    /// parameter to guard against cross-site request forgery.
    pub async fn bind(port: u16, expected_state: String) -> Result<Self, AuthError> {
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::HandshakeFailed(format!("loopback bind: {e}")))?;
        let bound_addr = listener
            .local_addr()
            .map_err(|e| AuthError::HandshakeFailed(format!("loopback local_addr: {e}")))?;

        let (tx, rx) = oneshot::channel();
        let state = CallbackState {
            sender: std::sync::Arc::new(Mutex::new(Some(tx))),
            expected_state: expected_state.into(),
        };

        let app = Router::new()
            .route("/callback", get(handle_callback))
            .with_state(state);

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let redirect_uri = Url::parse(&format!("http://127.0.0.1:{}/callback", bound_addr.port()))
            .expect("constructed loopback URL is always valid");

        Ok(Self {
            redirect_uri,
            rx,
            server,
        })
    }

    /// Wait up to `timeout` for the callback to deliver a code.
    pub async fn wait_for_code(self, timeout: Duration) -> Result<String, AuthError> {
        let result = tokio::time::timeout(timeout, self.rx).await;
        self.server.abort();
        match result {
            Err(_) => Err(AuthError::HandshakeFailed(
                "timed out waiting for authorization callback".into(),
            )),
            Ok(Err(_)) => Err(AuthError::HandshakeFailed(
                "loopback listener dropped without a callback".into(),
            )),
            Ok(Ok(Err(reason))) => Err(AuthError::HandshakeFailed(format!(
                "authorization server returned an error: {reason}"
            ))),
            Ok(Ok(Ok(code))) => Ok(code),
        }
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let outcome = if let Some(err) = params.error {
        Err(err)
    } else if params.state.as_deref() != Some(&state.expected_state) {
        Err("state parameter mismatch".to_string())
    } else if let Some(code) = params.code {
        Ok(code)
    } else {
        Err("callback missing both code and error".to_string())
    };

    if let Some(tx) = state.sender.lock().unwrap().take() {
        let _ = tx.send(outcome);
    }

    Html("<html><body>Authorization complete, you may close this window.</body></html>")
}
