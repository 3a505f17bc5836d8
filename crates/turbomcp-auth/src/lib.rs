//! OAuth 2.1 authorization: client-side PKCE/DCR/loopback handshake and
//! server-side bearer validation.

mod bearer;
mod config;
mod dcr;
mod discovery;
mod error;
mod flow;
mod loopback;

pub use bearer::BearerValidator;
pub use config::AuthorizationConfig;
pub use dcr::{RegisteredClient, register_client};
pub use discovery::{AuthorizationServerMetadata, ProtectedResourceMetadata};
pub use error::AuthError;
pub use flow::{AccessToken, AuthorizationRequest, authorize};
pub use loopback::LoopbackListener;
