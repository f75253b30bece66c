use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::addr::Endpoint;

/// A Result alias where the Err case is `connect_tunnel::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by socket implementations and the tunneling socket.
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(crate) endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Malformed proxy or destination endpoint, or a bad option value
    InvalidArgument,
    /// The connect policy refused the destination
    PermissionDenied,
    /// Operation not valid in the socket's current state
    IllegalState,
    /// Transport or handshake failure, carried unchanged
    Io,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                endpoint: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub(crate) fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub(crate) fn with_endpoint(mut self, endpoint: Endpoint) -> Error {
        self.inner.endpoint = Some(endpoint);
        self
    }

    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// The endpoint the failing operation was aimed at, if known.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.inner.endpoint.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("connect_tunnel::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref endpoint) = self.inner.endpoint {
            f.field("endpoint", endpoint);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.inner.kind {
            Kind::InvalidArgument => "invalid argument",
            Kind::PermissionDenied => "permission denied",
            Kind::IllegalState => "illegal socket state",
            Kind::Io => "i/o error",
        };
        f.write_str(prefix)?;

        if let Some(ref endpoint) = self.inner.endpoint {
            write!(f, " ({endpoint})")?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::new(Kind::Io).with(error)
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.inner.kind {
            Kind::InvalidArgument => io::ErrorKind::InvalidInput,
            Kind::PermissionDenied => io::ErrorKind::PermissionDenied,
            Kind::IllegalState => io::ErrorKind::Unsupported,
            Kind::Io => return error.into_io(),
        };
        io::Error::new(kind, error)
    }
}
