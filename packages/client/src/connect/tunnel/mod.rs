//! HTTP CONNECT tunneling collaborator
//!
//! A `Tunneler` takes a `TunnelRequest` and either returns a live connection
//! through the proxy to the destination, or fails. It is a single blocking
//! call; retries, if any, are the tunneler's own business.

pub mod http_connect;
pub mod response;

use std::fmt;
use std::io;
use std::time::Duration;

use http::StatusCode;

use crate::addr::authority;
use crate::socket::SocketImpl;

pub use http_connect::HttpConnectTunneler;
pub use response::{ResponseHead, read_response_head};

/// Establishes tunnels through a forward HTTP proxy.
pub trait Tunneler: Send + Sync {
    /// Performs the CONNECT exchange described by `request`.
    ///
    /// # Errors
    ///
    /// Any transport failure or a non-success proxy response.
    fn tunnel(&self, request: &TunnelRequest) -> io::Result<TunnelConnection>;
}

impl<F> Tunneler for F
where
    F: Fn(&TunnelRequest) -> io::Result<TunnelConnection> + Send + Sync,
{
    fn tunnel(&self, request: &TunnelRequest) -> io::Result<TunnelConnection> {
        self(request)
    }
}

/// Everything needed to open one tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRequest {
    pub proxy_host: String,
    pub proxy_port: u16,
    pub destination_host: String,
    pub destination_port: u16,
    /// Bound on establishing the proxy connection; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
    /// Read timeout for the handshake and the tunneled connection
    pub read_timeout: Option<Duration>,
}

impl TunnelRequest {
    /// `host:port` of the destination as used in the CONNECT request line.
    #[must_use]
    pub fn authority(&self) -> String {
        authority(&self.destination_host, self.destination_port)
    }

    /// `http://host:port` form of the destination.
    #[must_use]
    pub fn target_url(&self) -> String {
        format!("http://{}", self.authority())
    }
}

/// Live connection through the proxy, usable as a socket implementation.
pub struct TunnelConnection {
    socket: Box<dyn SocketImpl>,
    status: StatusCode,
}

impl TunnelConnection {
    pub fn new(socket: Box<dyn SocketImpl>) -> Self {
        Self {
            socket,
            status: StatusCode::OK,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Status the proxy answered the CONNECT with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn into_socket_impl(self) -> Box<dyn SocketImpl> {
        self.socket
    }
}

impl fmt::Debug for TunnelConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConnection")
            .field("status", &self.status)
            .field("socket", &self.socket)
            .finish()
    }
}
