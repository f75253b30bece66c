use std::fmt;

use crate::error::{self, Result};
use crate::proxy::HostRules;

/// Decides whether a socket may connect to a destination.
pub trait ConnectPolicy: Send + Sync {
    /// # Errors
    ///
    /// A `PermissionDenied` error when the destination is not allowed.
    fn check_connect(&self, host: &str, port: u16) -> Result<()>;
}

impl<F> ConnectPolicy for F
where
    F: Fn(&str, u16) -> Result<()> + Send + Sync,
{
    fn check_connect(&self, host: &str, port: u16) -> Result<()> {
        self(host, port)
    }
}

/// Policy that allows every destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ConnectPolicy for AllowAll {
    fn check_connect(&self, _host: &str, _port: u16) -> Result<()> {
        Ok(())
    }
}

/// Denies destinations matching host rules, optionally only on some ports.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    hosts: HostRules,
    ports: Vec<u16>,
}

impl DenyList {
    /// Deny hosts matching a comma-separated rule list on every port.
    /// Rules use the same syntax as `NO_PROXY`.
    #[must_use]
    pub fn new(rules: &str) -> Self {
        Self {
            hosts: HostRules::parse(rules),
            ports: Vec::new(),
        }
    }

    /// Restrict the denial to the given ports.
    #[must_use]
    pub fn on_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports.extend(ports);
        self
    }
}

impl ConnectPolicy for DenyList {
    fn check_connect(&self, host: &str, port: u16) -> Result<()> {
        let port_listed = self.ports.is_empty() || self.ports.contains(&port);
        if port_listed && self.hosts.matches(host) {
            return Err(error::permission_denied(Denied {
                host: host.to_string(),
                port,
            }));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Denied {
    host: String,
    port: u16,
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connect to {}:{} denied by policy", self.host, self.port)
    }
}

impl std::error::Error for Denied {}
