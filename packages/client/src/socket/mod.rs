//! Sockets and their swappable implementations
//!
//! A [`Socket`] forwards every operation to a boxed [`SocketImpl`].
//! [`TunnelingSocket`] is the implementation that routes an outbound connect
//! through an HTTP CONNECT proxy and then forwards to the tunnel.

pub mod builder;
pub mod handle;
pub mod imp;
pub mod tunneling;

pub use builder::TunnelingSocketBuilder;
pub use handle::Socket;
pub use imp::{DelegatingImpl, InputStream, OutputStream, RawDescriptor, SocketImpl};
pub use tunneling::TunnelingSocket;
