//! Client-role stdio transport: spawns a child process and owns its pipes.
//!
//! A background reader task parks on the child's stdout and pushes frames
//! into a bounded queue; [`ChildProcessHandle::recv`] drains that queue with
//! a caller-supplied deadline. Writes go straight to the child's stdin.

use std::process::Stdio;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, warn};
use turbomcp_transport_traits::TransportError;

use crate::config::StdioClientConfig;

type StdinWriter = FramedWrite<ChildStdin, LinesCodec>;

/// A spawned MCP server child process, communicating over stdio.
pub struct StdioClientTransport {
    child: Mutex<Child>,
    stdin: Mutex<StdinWriter>,
    rx: Mutex<mpsc::Receiver<Bytes>>,
    reader_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    config: StdioClientConfig,
}

/// A lightweight alias kept for callers that only need the process handle
/// shape (pid, wait) without the transport's send/recv plumbing.
pub type ChildProcessHandle = StdioClientTransport;

impl StdioClientTransport {
    /// Spawn `program` with `args`, piping its stdin/stdout and inheriting
    /// stderr (reserved for diagnostics — it must never carry protocol
    /// frames).
    pub async fn spawn(
        program: &str,
        args: &[String],
        config: StdioClientConfig,
    ) -> Result<Self, TransportError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Configuration("child stdin not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Configuration("child stdout not piped".into()))?;

        let (tx, rx) = mpsc::channel(256);
        let max_response_size = config.max_response_size;
        let reader_task = tokio::spawn(async move {
            let mut reader = FramedRead::new(BufReader::new(stdout), LinesCodec::new());
            loop {
                match reader.next().await {
                    None => {
                        debug!("stdio client: child stdout EOF");
                        break;
                    }
                    Some(Ok(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if line.len() > max_response_size {
                            let error = TransportError::MessageTooLarge {
                                size: line.len(),
                                limit: max_response_size,
                            };
                            warn!(%error, "stdio client: oversized response line");
                            continue;
                        }
                        if tx.send(Bytes::copy_from_slice(line.as_bytes())).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "stdio client: read error");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(FramedWrite::new(stdin, LinesCodec::new())),
            rx: Mutex::new(rx),
            reader_task: Mutex::new(Some(reader_task)),
            config,
        })
    }

    /// Write one frame to the child's stdin, newline-terminated.
    pub async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        let line = String::from_utf8_lossy(&payload).into_owned();
        let mut stdin = self.stdin.lock().await;
        stdin
            .send(line)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    /// Wait up to `timeout` for the next frame; `Ok(None)` on timeout.
    pub async fn recv(&self, timeout: Duration) -> Result<Option<Bytes>, TransportError> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(bytes)) => Ok(Some(bytes)),
            Ok(None) => Ok(None),
            Err(_) => Ok(None),
        }
    }

    /// Close pipes in order (stdin-write, await-process, stdout-read) and
    /// terminate the child: SIGTERM then SIGKILL after a grace period on
    /// POSIX, or a timed wait then `TerminateProcess` on Windows.
    pub async fn shutdown(&self) -> Result<(), TransportError> {
        {
            // Close our end of stdin first so the child sees EOF on its stdin.
            let mut stdin = self.stdin.lock().await;
            let _ = stdin.close().await;
        }

        let mut child = self.child.lock().await;
        self.terminate(&mut child).await;

        if let Some(task) = self.reader_task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }

    #[cfg(unix)]
    async fn terminate(&self, child: &mut Child) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Some(id) = child.id() {
            let _ = kill(Pid::from_raw(id as i32), Signal::SIGTERM);
        }

        if tokio::time::timeout(self.config.shutdown_grace_period, child.wait())
            .await
            .is_err()
        {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }

    #[cfg(windows)]
    async fn terminate(&self, child: &mut Child) {
        if tokio::time::timeout(self.config.shutdown_grace_period, child.wait())
            .await
            .is_err()
        {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_line_through_a_cat_child() {
        let transport = StdioClientTransport::spawn("cat", &[], StdioClientConfig::default())
            .await
            .unwrap();
        transport
            .send(Bytes::from_static(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
            .await
            .unwrap();
        let reply = transport
            .recv(Duration::from_secs(5))
            .await
            .unwrap()
            .expect("cat should echo the line back");
        assert_eq!(
            reply.as_ref(),
            br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#
        );
        transport.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn recv_times_out_when_nothing_arrives() {
        let transport = StdioClientTransport::spawn("cat", &[], StdioClientConfig::default())
            .await
            .unwrap();
        let reply = transport.recv(Duration::from_millis(100)).await.unwrap();
        assert!(reply.is_none());
        transport.shutdown().await.unwrap();
    }
}
