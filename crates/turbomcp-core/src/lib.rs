//! The JSON-RPC 2.0 envelope MCP is layered on.

mod jsonrpc;

pub use jsonrpc::{Frame, RequestId, RpcError};
