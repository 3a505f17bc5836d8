//! Top-level facade over the `turbomcp-*` crates: the JSON-RPC envelope,
//! both transports, the OAuth 2.1 client flow, the server runtime, and the
//! client facade, all behind one `prelude`.

pub use turbomcp_core::{Frame, RequestId, RpcError};
pub use turbomcp_transport_traits::{SessionDirectory, SessionId, Transport, TransportError, TransportHandler};
pub use turbomcp_types::{
    ContentItem, PropertySpec, PropertyType, PropertyValue, SchemaObject, Tool, ToolDescriptor,
    ToolHandler, ToolInvocation, ToolSink,
};

pub use turbomcp_auth::{AccessToken, AuthError, AuthorizationConfig, AuthorizationRequest, BearerValidator};

pub use turbomcp_stdio::{
    ChildProcessHandle, StdioClientConfig, StdioClientTransport, StdioServerConfig, StdioServerTransport,
};
pub use turbomcp_http::{
    HttpAuthorization, HttpClientConfig, HttpClientTransport, HttpServerConfig, HttpServerTransport,
    DEFAULT_TICKS_BEFORE_EVICT,
};

pub use turbomcp_server::{Dispatcher, DispatchError, Server, ServerBuilder, ServerInfo, Session, SessionRegistry};
pub use turbomcp_client::{Client, ClientError, ClientTransport, InitializeResult};

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`, defaulting
/// to `info` when the variable is unset. Intended for binaries (demos,
/// servers) — library code should never install a global subscriber.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything most binaries need in one `use turbomcp::prelude::*`.
pub mod prelude {
    pub use crate::{
        init_tracing, AuthorizationConfig, BearerValidator, Client, ClientTransport, ContentItem,
        Dispatcher, HttpClientConfig, HttpClientTransport, HttpServerConfig, HttpServerTransport,
        InitializeResult, PropertySpec, PropertyType, PropertyValue, Server, ServerBuilder, ServerInfo,
        StdioClientConfig, StdioClientTransport, StdioServerConfig, StdioServerTransport, Tool,
        ToolDescriptor, ToolHandler, ToolInvocation, ToolSink,
    };
}
