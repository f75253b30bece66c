use std::io;

use super::types::{Error, Inner, Kind};

impl Error {
    /// Returns true if an endpoint, option value or configuration was rejected.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.inner.kind, Kind::InvalidArgument)
    }

    /// Returns true if the connect policy denied the destination.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.inner.kind, Kind::PermissionDenied)
    }

    /// Returns true if the operation is not valid for the socket's state,
    /// e.g. `listen` on a tunneling socket or a second `connect`.
    #[must_use]
    pub fn is_illegal_state(&self) -> bool {
        matches!(self.inner.kind, Kind::IllegalState)
    }

    /// Returns true if this is a transport or handshake failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self.inner.kind, Kind::Io)
    }

    /// Returns true if the underlying I/O failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.io_error()
            .is_some_and(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
    }

    /// The original I/O error, exactly as the delegate or tunneler reported it.
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        self.inner
            .source
            .as_ref()
            .and_then(|source| source.downcast_ref::<io::Error>())
    }

    /// Converts into an `io::Error`. An I/O failure gives back the original
    /// error value rather than a wrapper around it.
    #[must_use]
    pub fn into_io(self) -> io::Error {
        if !self.is_io() {
            return io::Error::from(self);
        }

        let Inner { source, endpoint, .. } = *self.inner;
        match source.map(|source| source.downcast::<io::Error>()) {
            Some(Ok(original)) => *original,
            Some(Err(other)) => io::Error::other(other),
            None => {
                let mut error = Error::new(Kind::Io);
                error.inner.endpoint = endpoint;
                io::Error::other(error)
            }
        }
    }
}
