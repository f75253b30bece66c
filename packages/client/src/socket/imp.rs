//! Socket implementation contract
//!
//! `SocketImpl` is the full operation surface a socket forwards to. Plain TCP
//! sockets, tunneled connections and test doubles all implement it, which is
//! what allows a socket to swap the implementation it owns mid-lifetime.

use std::fmt;
use std::io::{Read, Write};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::addr::{Endpoint, Host};
use crate::error::Result;
use crate::options::{OptionValue, SocketOption};

/// Readable half handed out by a socket implementation.
pub type InputStream = Box<dyn Read + Send>;

/// Writable half handed out by a socket implementation.
pub type OutputStream = Box<dyn Write + Send>;

/// OS-level handle of the underlying socket.
#[cfg(unix)]
pub type RawDescriptor = std::os::fd::RawFd;
#[cfg(windows)]
pub type RawDescriptor = std::os::windows::io::RawSocket;
#[cfg(not(any(unix, windows)))]
pub type RawDescriptor = i32;

/// Operations a socket delegates to its implementation.
pub trait SocketImpl: fmt::Debug + Send {
    /// Prepares the implementation; `stream` selects TCP over datagrams.
    fn create(&mut self, stream: bool) -> Result<()>;

    /// Connects to `endpoint`. `None` waits as long as the transport does.
    fn connect(&mut self, endpoint: &Endpoint, timeout: Option<Duration>) -> Result<()>;

    fn connect_host(&mut self, host: &str, port: u16) -> Result<()> {
        self.connect(&Endpoint::inet(host, port), None)
    }

    fn connect_addr(&mut self, ip: IpAddr, port: u16) -> Result<()> {
        self.connect(&SocketAddr::new(ip, port).into(), None)
    }

    fn bind(&mut self, host: IpAddr, port: u16) -> Result<()>;

    fn listen(&mut self, backlog: u32) -> Result<()>;

    /// Accepts one pending connection as a new implementation.
    fn accept(&mut self) -> Result<Box<dyn SocketImpl>>;

    fn input_stream(&mut self) -> Result<InputStream>;

    fn output_stream(&mut self) -> Result<OutputStream>;

    /// Bytes readable without blocking.
    fn available(&self) -> Result<usize>;

    fn close(&mut self) -> Result<()>;

    fn shutdown_input(&mut self) -> Result<()>;

    fn shutdown_output(&mut self) -> Result<()>;

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()>;

    fn get_option(&self, option: SocketOption) -> Result<OptionValue>;

    fn supported_options(&self) -> Vec<SocketOption> {
        SocketOption::ALL.to_vec()
    }

    fn supports_urgent_data(&self) -> bool {
        false
    }

    fn send_urgent_data(&mut self, data: u8) -> Result<()>;

    /// Remote host, `None` when not connected.
    fn inet_address(&self) -> Option<Host>;

    /// Remote port, `0` when not connected.
    fn port(&self) -> u16;

    /// Local port, `0` when not bound.
    fn local_port(&self) -> u16;

    fn local_address(&self) -> Option<SocketAddr>;

    fn raw_descriptor(&self) -> Option<RawDescriptor>;

    /// Exposes the delegation capability of wrapping implementations.
    fn as_delegating(&self) -> Option<&dyn DelegatingImpl> {
        None
    }
}

/// Implementation that forwards to another implementation.
pub trait DelegatingImpl {
    /// The implementation currently forwarded to.
    fn delegate(&self) -> &dyn SocketImpl;

    /// A fresh instance of the same delegation strategy around `base`.
    fn new_instance(&self, base: Box<dyn SocketImpl>) -> Box<dyn SocketImpl>;
}
