//! The MCP client facade: `initialize`, `tools/list`, `tools/call` behind a
//! `Client` bound to either a stdio child process or an HTTP/SSE endpoint.

mod client;
mod error;
mod transport;

pub use client::{Client, InitializeResult, ServerInfo};
pub use error::ClientError;
pub use transport::ClientTransport;
