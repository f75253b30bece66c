//! Tunnel configuration and builder methods
//!
//! Settings used by the HTTP CONNECT tunneler when it negotiates a tunnel
//! with the proxy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cap on the size of the proxy's CONNECT response head.
pub const DEFAULT_MAX_RESPONSE_HEADER_BYTES: usize = 8 * 1024;

/// HTTP CONNECT tunnel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Connect timeout used when the socket passes none
    pub connect_timeout: Option<Duration>,

    /// Largest accepted CONNECT response head, in bytes
    pub max_response_header_bytes: usize,

    /// `User-Agent` sent with the CONNECT request
    pub user_agent: Option<String>,

    /// Extra headers sent with the CONNECT request
    pub extra_headers: Vec<(String, String)>,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            max_response_header_bytes: DEFAULT_MAX_RESPONSE_HEADER_BYTES,
            user_agent: Some(concat!("connect_tunnel/", env!("CARGO_PKG_VERSION")).to_string()),
            extra_headers: Vec::new(),
        }
    }
}

impl TunnelConfig {
    /// Set the fallback connect timeout
    ///
    /// Applies only when `connect` is called without a timeout.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use connect_tunnel::config::TunnelConfig;
    ///
    /// let config = TunnelConfig::default()
    ///     .with_connect_timeout(Duration::from_secs(5));
    /// assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
    /// ```
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum size of the proxy's response head
    #[must_use]
    pub fn with_max_response_header_bytes(mut self, limit: usize) -> Self {
        self.max_response_header_bytes = limit;
        self
    }

    /// Set or clear the `User-Agent` header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Add a header to every CONNECT request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}
