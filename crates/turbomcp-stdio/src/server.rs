//! Server-role stdio transport: owns the process's stdin/stdout.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::BufReader;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, trace, warn};
use turbomcp_transport_traits::{SessionId, Transport, TransportError, TransportHandler};

use crate::config::StdioServerConfig;

type StdoutWriter = FramedWrite<tokio::io::Stdout, LinesCodec>;

/// Stdio transport for the server role.
///
/// Reads newline-delimited JSON frames from stdin on a background task and
/// writes responses to stdout under a single write lock, so writes never
/// interleave. Exactly one logical session exists, identified by
/// [`SessionId::root`].
pub struct StdioServerTransport {
    config: StdioServerConfig,
    stdout: Mutex<StdoutWriter>,
    running: AtomicBool,
    reader_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl StdioServerTransport {
    /// Build a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StdioServerConfig::default())
    }

    /// Build a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: StdioServerConfig) -> Self {
        Self {
            config,
            stdout: Mutex::new(FramedWrite::new(tokio::io::stdout(), LinesCodec::new())),
            running: AtomicBool::new(false),
            reader_task: Mutex::new(None),
        }
    }
}

impl Default for StdioServerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioServerTransport {
    async fn open(&self, handler: Arc<dyn TransportHandler>) -> Result<(), TransportError> {
        self.running.store(true, Ordering::SeqCst);
        let max_request_size = self.config.max_request_size;

        let task = tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = FramedRead::new(BufReader::new(stdin), LinesCodec::new());

            loop {
                match reader.next().await {
                    None => {
                        debug!("stdio: EOF on stdin, shutting down");
                        break;
                    }
                    Some(Ok(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if line.len() > max_request_size {
                            let error = TransportError::MessageTooLarge {
                                size: line.len(),
                                limit: max_request_size,
                            };
                            warn!(%error, "stdio: rejecting oversized request line");
                            continue;
                        }
                        trace!(bytes = line.len(), "stdio: received frame");
                        handler
                            .on_recv(&SessionId::root(), Bytes::copy_from_slice(line.as_bytes()))
                            .await;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "stdio: read error, shutting down");
                        break;
                    }
                }
            }

            handler.on_close(&SessionId::root()).await;
        });

        *self.reader_task.lock().await = Some(task);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }

    async fn poll(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        if let Some(task) = self.reader_task.lock().await.as_ref() {
            if task.is_finished() {
                self.running.store(false, Ordering::SeqCst);
                return false;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        true
    }

    async fn emit(
        &self,
        session: &SessionId,
        payload: Bytes,
        _is_final: bool,
    ) -> Result<(), TransportError> {
        if !session.is_root() {
            return Err(TransportError::UnknownSession(session.to_string()));
        }
        let line = String::from_utf8_lossy(&payload).into_owned();
        let mut writer = self.stdout.lock().await;
        writer
            .send(line)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_not_running_until_opened() {
        let transport = StdioServerTransport::new();
        assert!(!transport.running.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn emit_on_unknown_session_is_rejected() {
        let transport = StdioServerTransport::new();
        let other = SessionId::from("not-root");
        let err = transport
            .emit(&other, Bytes::from_static(b"{}"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UnknownSession(_)));
    }
}
