//! # connect_tunnel
//!
//! Blocking client sockets that reach their destination through an HTTP
//! CONNECT tunnel. A [`Socket`] forwards to a swappable [`SocketImpl`];
//! [`TunnelingSocket`] is the implementation that, on connect, asks a
//! [`Tunneler`] for a tunnel to the destination, closes its original
//! implementation and forwards to the tunnel from then on. Options set before
//! the tunnel existed are replayed onto it.
//!
//! ## Features
//!
//! - **HTTP CONNECT tunneling** with optional Basic proxy authentication
//! - **Swappable implementations** behind a stable `Socket` value
//! - **Best-effort option replay** onto the tunneled connection
//! - **`NO_PROXY` bypass rules** including CIDR blocks
//! - **Connect policies** consulted before any network activity
//!
//! ## Usage
//!
//! ```no_run
//! use std::io::{Read, Write};
//! use std::time::Duration;
//!
//! use connect_tunnel::{Proxy, Socket, SocketOption};
//!
//! fn main() -> connect_tunnel::Result<()> {
//!     let proxy = Proxy::from_url("http://proxy.local:8080")?;
//!     let mut socket = Socket::with_proxy(&proxy)?;
//!     socket.set_option(SocketOption::TcpNoDelay, true)?;
//!     socket.connect_timeout(("example.org", 443), Some(Duration::from_secs(5)))?;
//!
//!     socket.write_all(b"hello")?;
//!     let mut reply = [0u8; 5];
//!     socket.read_exact(&mut reply)?;
//!     socket.close()
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod addr;
pub mod config;
pub mod connect;
pub mod error;
pub mod options;
pub mod proxy;
pub mod security;
pub mod socket;

pub use crate::addr::{Endpoint, Host, InetSocketAddr};
pub use crate::config::{ConfigurationError, TunnelConfig};
pub use crate::connect::{HttpConnectTunneler, PlainSocketImpl, TunnelConnection, TunnelRequest, Tunneler};
pub use crate::error::{Error, Kind, Result};
pub use crate::options::{OptionValue, SocketOption};
pub use crate::proxy::{NoProxy, Proxy, ProxyCredentials};
pub use crate::security::{AllowAll, ConnectPolicy, DenyList};
pub use crate::socket::{
    DelegatingImpl, Socket, SocketImpl, TunnelingSocket, TunnelingSocketBuilder,
};
