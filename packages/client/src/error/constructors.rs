use super::types::{Error, Kind};
use crate::addr::Endpoint;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a rejected argument.
pub fn invalid_argument<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::InvalidArgument).with(e.into())
}

/// Creates an `Error` for an endpoint that is not a host and port.
pub fn unsupported_address(endpoint: &Endpoint) -> Error {
    Error::new(Kind::InvalidArgument)
        .with(super::helpers::UnsupportedAddressType)
        .with_endpoint(endpoint.clone())
}

/// Creates an `Error` for a destination refused by the connect policy.
pub fn permission_denied<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::PermissionDenied).with(e.into())
}

/// Creates an `Error` for an operation invalid in the current socket state.
pub fn illegal_state<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::IllegalState).with(e.into())
}

/// Creates an `Error` for `listen`/`accept` on an outbound-only socket.
pub fn not_a_server_socket() -> Error {
    Error::new(Kind::IllegalState).with(super::helpers::ClientOnly)
}

/// Creates an `Error` for an operation on a closed socket.
pub fn socket_closed() -> Error {
    Error::from(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        super::helpers::SocketClosed,
    ))
}

/// Creates an `Error` for an operation needing a connected socket.
pub fn not_connected() -> Error {
    Error::from(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "socket is not connected",
    ))
}
