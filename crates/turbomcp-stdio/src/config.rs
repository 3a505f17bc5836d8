//! Stdio transport configuration.

use std::time::Duration;

/// Default `max_request_size`: a request line above this many bytes is
/// rejected rather than truncated or split across frames.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 128 * 1024;

/// Server-role stdio transport configuration.
#[derive(Debug, Clone)]
pub struct StdioServerConfig {
    /// A request line above this size is rejected, not truncated.
    pub max_request_size: usize,
}

impl Default for StdioServerConfig {
    fn default() -> Self {
        Self {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

/// Client-role (parent-of-child-process) stdio transport configuration.
#[derive(Debug, Clone)]
pub struct StdioClientConfig {
    /// Deadline for one in-flight request.
    pub request_timeout: Duration,
    /// Grace period between SIGTERM and SIGKILL on shutdown (POSIX only).
    pub shutdown_grace_period: Duration,
    /// A response line above this size is rejected, not truncated.
    pub max_response_size: usize,
}

impl Default for StdioClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            shutdown_grace_period: Duration::from_secs(2),
            max_response_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}
