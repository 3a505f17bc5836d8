//! The server builder and run loop: wires a transport to the dispatcher and
//! drives it until shutdown.

use std::sync::Arc;

use tracing::info;
use turbomcp_auth::{AuthorizationConfig, BearerValidator};
use turbomcp_http::{HttpAuthorization, HttpServerConfig, HttpServerTransport, DEFAULT_TICKS_BEFORE_EVICT};
use turbomcp_stdio::{StdioServerConfig, StdioServerTransport};
use turbomcp_transport_traits::{SessionId, Transport, TransportHandler};
use turbomcp_types::Tool;

use crate::dispatch::{Dispatcher, ServerInfo};
use crate::error::DispatchError;
use crate::session::SessionRegistry;
use crate::tools::ToolRegistry;

enum TransportChoice {
    Stdio(StdioServerConfig),
    Http(HttpServerConfig),
}

/// Configures a server's identity, transport, and initial tool set before
/// handing off to [`Server::run`].
pub struct ServerBuilder {
    server_info: ServerInfo,
    registry: Arc<ToolRegistry>,
    transport: Option<TransportChoice>,
}

impl ServerBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            server_info: ServerInfo::new(name, version),
            registry: Arc::new(ToolRegistry::new()),
            transport: None,
        }
    }

    /// Serve over stdio with default transport configuration.
    #[must_use]
    pub fn stdio(self) -> Self {
        self.stdio_with_config(StdioServerConfig::default())
    }

    #[must_use]
    pub fn stdio_with_config(mut self, config: StdioServerConfig) -> Self {
        self.transport = Some(TransportChoice::Stdio(config));
        self
    }

    /// Serve over HTTP/SSE with the given configuration.
    #[must_use]
    pub fn http(mut self, config: HttpServerConfig) -> Self {
        self.transport = Some(TransportChoice::Http(config));
        self
    }

    /// Serve over HTTP/SSE with bearer-token authorization turned on: every
    /// POST to `config.entry_point` must carry a token whose audience
    /// matches `auth.resource`, and the discovery document is mounted
    /// alongside the tool endpoint.
    #[must_use]
    pub fn http_with_authorization(mut self, mut config: HttpServerConfig, auth: AuthorizationConfig) -> Self {
        let validator = Arc::new(BearerValidator::new(auth.resource.to_string()));
        config.authorization = Some(HttpAuthorization {
            discovery: auth,
            validator,
        });
        self.transport = Some(TransportChoice::Http(config));
        self
    }

    /// Register a tool before the server starts accepting connections.
    /// Tools can also be registered on the built [`Server`] after `run()`
    /// starts — registration is never exclusive to the pre-run phase.
    #[must_use]
    pub fn register_tool(self, tool: Tool) -> Self {
        self.registry.insert(tool.name.clone(), tool);
        self
    }

    pub fn build(self) -> Result<Server, DispatchError> {
        let ticks_before_evict = match &self.transport {
            Some(TransportChoice::Http(config)) => config.ticks_before_evict,
            _ => DEFAULT_TICKS_BEFORE_EVICT,
        };
        let sessions = Arc::new(SessionRegistry::new(ticks_before_evict));
        let dispatcher = Arc::new(Dispatcher::new(
            self.registry.clone(),
            sessions.clone(),
            self.server_info,
        ));

        let transport: Arc<dyn Transport> = match self
            .transport
            .ok_or_else(|| DispatchError::Io(std::io::Error::other("no transport configured")))?
        {
            TransportChoice::Stdio(config) => {
                sessions.create_with_id(SessionId::root());
                Arc::new(StdioServerTransport::with_config(config))
            }
            TransportChoice::Http(config) => {
                Arc::new(HttpServerTransport::new(config, sessions.clone()))
            }
        };

        dispatcher.bind_transport(transport.clone());

        Ok(Server {
            dispatcher,
            registry: self.registry,
            transport,
        })
    }
}

/// A built, runnable server: a transport wired to a dispatcher over a
/// shared tool registry.
pub struct Server {
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ToolRegistry>,
    transport: Arc<dyn Transport>,
}

impl Server {
    /// Register (or replace) a tool while the server is running. Visible to
    /// `tools/list` calls dispatched after this call returns.
    pub fn register_tool(&self, tool: Tool) {
        self.registry.insert(tool.name.clone(), tool);
    }

    /// Open the transport and drive it until it stops polling or the
    /// process receives a shutdown signal.
    pub async fn run(&self) -> Result<(), DispatchError> {
        let handler: Arc<dyn TransportHandler> = self.dispatcher.clone();
        self.transport.open(handler).await?;
        info!("server running");

        loop {
            tokio::select! {
                keep_going = self.transport.poll() => {
                    if !keep_going {
                        break;
                    }
                }
                () = shutdown_signal() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.transport.close().await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_a_transport_is_rejected() {
        let result = ServerBuilder::new("t", "0.1.0").build();
        assert!(result.is_err());
    }

    #[test]
    fn stdio_server_builds_with_an_empty_registry() {
        let server = ServerBuilder::new("t", "0.1.0").stdio().build().unwrap();
        assert_eq!(server.registry.len(), 0);
    }

    #[test]
    fn http_with_authorization_mounts_a_validator() {
        use url::Url;

        let auth = AuthorizationConfig::new(
            Url::parse("https://mcp.example.com/").unwrap(),
            vec![Url::parse("https://auth.example.com/").unwrap()],
        );
        let config = HttpServerConfig::new("127.0.0.1:0".parse().unwrap());
        let server = ServerBuilder::new("t", "0.1.0")
            .http_with_authorization(config, auth)
            .build()
            .unwrap();
        assert_eq!(server.registry.len(), 0);
    }

    #[test]
    fn registered_tools_are_visible_on_the_built_server() {
        use turbomcp_types::Tool;

        let tool = Tool {
            name: "ping_tool".into(),
            description: "d".into(),
            input_schema: vec![],
            output_schema: vec![],
            handler: Arc::new(|_| Box::pin(async {})),
        };
        let server = ServerBuilder::new("t", "0.1.0")
            .stdio()
            .register_tool(tool)
            .build()
            .unwrap();
        assert!(server.registry.contains_key("ping_tool"));
    }
}
