//! Proxy configuration
//!
//! A socket either connects directly or tunnels through one forward HTTP
//! proxy. `NoProxy` rules let selected destinations skip the proxy.

pub mod no_proxy;
pub mod types;
pub mod url_handling;

pub use no_proxy::{HostRules, NoProxy};
pub use types::{Proxy, ProxyCredentials};
