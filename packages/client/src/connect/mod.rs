//! Connection establishment
//!
//! `tcp` connects directly; `tunnel` negotiates an HTTP CONNECT tunnel
//! through a forward proxy.

pub mod tcp;
pub mod tunnel;

pub use tcp::PlainSocketImpl;
pub use tunnel::{HttpConnectTunneler, TunnelConnection, TunnelRequest, Tunneler};
