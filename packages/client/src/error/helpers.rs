use std::fmt;
use std::time::Duration;

/// A marker type to indicate that an endpoint was not a host and port.
#[derive(Debug)]
pub struct UnsupportedAddressType;

impl fmt::Display for UnsupportedAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unsupported address type")
    }
}

impl std::error::Error for UnsupportedAddressType {}

/// A marker type to indicate a server-side operation on a client-only socket.
#[derive(Debug)]
pub struct ClientOnly;

impl fmt::Display for ClientOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tunneling sockets cannot listen or accept")
    }
}

impl std::error::Error for ClientOnly {}

/// A marker type to indicate that the socket was already closed.
#[derive(Debug)]
pub struct SocketClosed;

impl fmt::Display for SocketClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("socket closed")
    }
}

impl std::error::Error for SocketClosed {}

/// Converts a millisecond timeout where `0` means "wait indefinitely".
#[must_use]
pub fn timeout_from_millis(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

/// Treats a zero timeout like an absent one.
#[must_use]
pub fn effective_timeout(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}
