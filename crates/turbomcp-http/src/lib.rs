//! Streamable HTTP/SSE transport for MCP: one endpoint, both roles.
//!
//! Server role ([`HttpServerTransport`]) mounts a POST/DELETE/GET router on
//! [`HttpServerConfig::entry_point`] over axum, streaming responses back as
//! Server-Sent Events keyed by `Mcp-Session-Id`. Client role
//! ([`HttpClientTransport`]) is a plain reqwest client that knows how to
//! read both an immediate JSON body and an SSE response, and how to run the
//! authorization handshake on a 401.

mod client;
mod config;
mod server;

pub use client::HttpClientTransport;
pub use config::{HttpAuthorization, HttpClientConfig, HttpServerConfig, DEFAULT_TICKS_BEFORE_EVICT};
pub use server::HttpServerTransport;
