//! The MCP server runtime: session registry, protocol dispatcher, tool
//! registry, and the builder that wires a transport to all three.

mod dispatch;
mod error;
mod runtime;
mod session;
mod tools;

pub use dispatch::{Dispatcher, ServerInfo};
pub use error::DispatchError;
pub use runtime::{Server, ServerBuilder};
pub use session::{Session, SessionRegistry};
pub use tools::{ToolRegistry, TransportSink};
