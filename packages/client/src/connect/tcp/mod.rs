//! Plain TCP connections
//!
//! Blocking socket implementation over `socket2` plus synchronous host
//! resolution.

pub mod dns;
pub mod plain;

pub use dns::{resolve_endpoint, resolve_host_sync};
pub use plain::PlainSocketImpl;
