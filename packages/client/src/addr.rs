//! Endpoint addresses
//!
//! A socket endpoint is either an internet host and port, the only kind a
//! tunneling socket accepts, or some other address family such as a local
//! (Unix domain) path.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Remote or local endpoint of a socket operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Internet host and port
    Inet(InetSocketAddr),
    /// Local socket path; never valid for tunneling
    Unix(PathBuf),
}

impl Endpoint {
    /// Internet endpoint from a host string and port. See [`InetSocketAddr::new`].
    pub fn inet(host: impl Into<String>, port: u16) -> Self {
        Endpoint::Inet(InetSocketAddr::new(host, port))
    }

    /// Returns the host and port if this is an internet endpoint.
    #[must_use]
    pub fn as_inet(&self) -> Option<&InetSocketAddr> {
        match self {
            Endpoint::Inet(addr) => Some(addr),
            Endpoint::Unix(_) => None,
        }
    }
}

impl From<InetSocketAddr> for Endpoint {
    fn from(addr: InetSocketAddr) -> Self {
        Endpoint::Inet(addr)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Endpoint::Inet(addr.into())
    }
}

impl From<(&str, u16)> for Endpoint {
    fn from((host, port): (&str, u16)) -> Self {
        Endpoint::inet(host, port)
    }
}

impl From<(String, u16)> for Endpoint {
    fn from((host, port): (String, u16)) -> Self {
        Endpoint::inet(host, port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Inet(addr) => addr.fmt(f),
            Endpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Host part of an internet endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    /// Numeric address, optionally with the name it was resolved from
    Resolved { ip: IpAddr, name: Option<String> },
    /// Hostname that has not been looked up
    Unresolved(String),
}

impl Host {
    /// The hostname, if one is known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Host::Resolved { name, .. } => name.as_deref(),
            Host::Unresolved(name) => Some(name),
        }
    }

    /// The numeric address, if resolved.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Host::Resolved { ip, .. } => Some(*ip),
            Host::Unresolved(_) => None,
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Host::Resolved { ip, name: None }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Resolved { name: Some(name), .. } | Host::Unresolved(name) => f.write_str(name),
            Host::Resolved { ip, name: None } => ip.fmt(f),
        }
    }
}

/// Internet host and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InetSocketAddr {
    host: Host,
    port: u16,
}

impl InetSocketAddr {
    /// Builds an endpoint from a host string. IP literals (with or without
    /// IPv6 brackets) become resolved addresses; anything else is kept as an
    /// unresolved hostname. No name lookup happens here.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let literal = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&host);

        match literal.parse::<IpAddr>() {
            Ok(ip) => Self::from_ip(ip, port),
            Err(_) => Self::unresolved(host, port),
        }
    }

    /// Endpoint for a hostname that should not be looked up locally.
    pub fn unresolved(name: impl Into<String>, port: u16) -> Self {
        Self {
            host: Host::Unresolved(name.into()),
            port,
        }
    }

    #[must_use]
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        Self {
            host: ip.into(),
            port,
        }
    }

    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self.host, Host::Unresolved(_))
    }

    /// Hostname if known, otherwise the textual IP.
    #[must_use]
    pub fn host_string(&self) -> String {
        self.host.to_string()
    }

    /// Host string used as a tunnel destination: the textual IP when
    /// resolved, the hostname as given when not.
    #[must_use]
    pub fn destination_host(&self) -> String {
        match &self.host {
            Host::Resolved { ip, .. } => ip.to_string(),
            Host::Unresolved(name) => name.clone(),
        }
    }

    /// Socket address if the host is resolved.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.host.ip().map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl From<SocketAddr> for InetSocketAddr {
    fn from(addr: SocketAddr) -> Self {
        Self::from_ip(addr.ip(), addr.port())
    }
}

impl fmt::Display for InetSocketAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Host::Resolved { ip: IpAddr::V6(ip), name: None } => write!(f, "[{ip}]:{}", self.port),
            host => write!(f, "{host}:{}", self.port),
        }
    }
}

/// Formats `host:port` for a request target, bracketing IPv6 literals.
pub(crate) fn authority(host: &str, port: u16) -> String {
    if host.parse::<std::net::Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    #[test]
    fn hostnames_stay_unresolved() {
        let addr = InetSocketAddr::new("example.org", 443);
        assert!(addr.is_unresolved());
        assert_eq!(addr.destination_host(), "example.org");
        assert_eq!(addr.host().name(), Some("example.org"));
        assert_eq!(addr.socket_addr(), None);
    }

    #[test]
    fn ip_literals_are_resolved() {
        let addr = InetSocketAddr::new("[::1]", 8443);
        assert!(!addr.is_unresolved());
        assert_eq!(addr.destination_host(), "::1");
        assert_eq!(addr.to_string(), "[::1]:8443");

        let v4 = InetSocketAddr::new("10.0.0.7", 80);
        assert_eq!(v4.host().ip(), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))));
    }

    #[test]
    fn authority_brackets_ipv6() {
        assert_eq!(authority("::1", 443), "[::1]:443");
        assert_eq!(authority("example.org", 443), "example.org:443");
        assert_eq!(authority("127.0.0.1", 80), "127.0.0.1:80");
    }

    #[test]
    fn only_inet_endpoints_expose_host_and_port() {
        let unix = Endpoint::Unix(PathBuf::from("/tmp/proxy.sock"));
        assert!(unix.as_inet().is_none());
        assert_eq!(
            Endpoint::inet("proxy.local", 8080).as_inet().map(InetSocketAddr::port),
            Some(8080)
        );
    }
}
