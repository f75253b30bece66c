//! Synchronous host resolution for plain TCP connects

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::addr::{Host, InetSocketAddr};

/// Resolve hostname to socket addresses synchronously.
///
/// IP literals take a fast path and never hit the resolver.
pub fn resolve_host_sync(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    if host.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty hostname"));
    }

    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| io::Error::new(e.kind(), format!("DNS resolution failed for {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No addresses resolved for {host}"),
        ));
    }

    Ok(addrs)
}

/// Resolves an endpoint, keeping a resolved host as is.
pub fn resolve_endpoint(addr: &InetSocketAddr) -> io::Result<Vec<SocketAddr>> {
    match addr.host() {
        Host::Resolved { ip, .. } => Ok(vec![SocketAddr::new(*ip, addr.port())]),
        Host::Unresolved(name) => resolve_host_sync(name, addr.port()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_literals_skip_lookup() {
        let addrs = resolve_host_sync("127.0.0.1", 8080).expect("literal resolves");
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse::<SocketAddr>().expect("valid")]);

        let v6 = resolve_host_sync("::1", 8080).expect("literal resolves");
        assert_eq!(v6.len(), 1);
        assert_eq!(v6[0].port(), 8080);
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(resolve_host_sync("", 80).is_err());
    }

    #[test]
    fn localhost_resolves() {
        let addrs = resolve_host_sync("localhost", 80).expect("localhost resolves");
        assert!(!addrs.is_empty());
    }
}
