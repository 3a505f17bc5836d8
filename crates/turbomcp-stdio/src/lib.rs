//! Newline-delimited JSON over stdin/stdout, both transport roles.
//!
//! The server role ([`StdioServerTransport`]) owns the current process's
//! stdin/stdout and exposes the single implicit session at
//! [`SessionId::root`](turbomcp_transport_traits::SessionId::root). The
//! client role ([`StdioClientTransport`]) spawns a child process and owns
//! its piped stdin/stdout instead.

mod client;
mod config;
mod server;

pub use client::{ChildProcessHandle, StdioClientTransport};
pub use config::{StdioClientConfig, StdioServerConfig};
pub use server::StdioServerTransport;
