//! Client socket facade
//!
//! `Socket` owns one `SocketImpl` and forwards to it. The implementation can
//! be replaced while the `Socket` value callers hold stays the same.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use super::imp::{InputStream, OutputStream, SocketImpl};
use super::tunneling::TunnelingSocket;
use crate::addr::{Endpoint, Host};
use crate::config::TunnelConfig;
use crate::connect::tcp::PlainSocketImpl;
use crate::connect::tunnel::HttpConnectTunneler;
use crate::error::{self, Result};
use crate::options::{OptionValue, SocketOption};
use crate::proxy::{NoProxy, Proxy};

/// Blocking client socket.
pub struct Socket {
    imp: Box<dyn SocketImpl>,
    reader: Option<InputStream>,
    writer: Option<OutputStream>,
    connected: bool,
    closed: bool,
}

impl Socket {
    /// Unconnected socket that connects directly.
    ///
    /// # Errors
    ///
    /// Propagates a failure to create the implementation.
    pub fn new() -> Result<Self> {
        Self::with_impl(Box::new(PlainSocketImpl::new()))
    }

    /// Socket over a caller-supplied implementation.
    ///
    /// # Errors
    ///
    /// Propagates a failure of `imp.create`.
    pub fn with_impl(mut imp: Box<dyn SocketImpl>) -> Result<Self> {
        imp.create(true)?;
        Ok(Self {
            imp,
            reader: None,
            writer: None,
            connected: false,
            closed: false,
        })
    }

    /// Socket that reaches its destination as `proxy` says.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a proxy endpoint that is not a host and port.
    pub fn with_proxy(proxy: &Proxy) -> Result<Self> {
        Self::with_proxy_config(proxy, TunnelConfig::default(), None)
    }

    /// Like [`Socket::with_proxy`] with explicit tunnel settings and bypass rules.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a bad proxy endpoint or invalid configuration.
    pub fn with_proxy_config(
        proxy: &Proxy,
        config: TunnelConfig,
        bypass: Option<NoProxy>,
    ) -> Result<Self> {
        match proxy {
            Proxy::NoProxy => Self::new(),
            Proxy::Http {
                endpoint,
                credentials,
            } => {
                let tunneler = HttpConnectTunneler::new(config)?.with_credentials(credentials.clone());
                let imp = TunnelingSocket::builder(endpoint.clone())
                    .tunneler(Arc::new(tunneler))
                    .no_proxy(bypass)
                    .build(Box::new(PlainSocketImpl::new()))?;
                Self::with_impl(Box::new(imp))
            }
        }
    }

    /// Socket configured from `HTTPS_PROXY`/`HTTP_PROXY`/`ALL_PROXY` and
    /// `NO_PROXY`.
    ///
    /// # Errors
    ///
    /// Same as [`Socket::with_proxy_config`].
    pub fn from_env() -> Result<Self> {
        Self::with_proxy_config(&Proxy::from_env(), TunnelConfig::default(), NoProxy::from_env())
    }

    /// New socket using the same delegation strategy as this one around
    /// `base`; `base` itself when this socket does not delegate.
    ///
    /// # Errors
    ///
    /// Propagates a failure to create the new implementation.
    pub fn sibling(&self, base: Box<dyn SocketImpl>) -> Result<Socket> {
        let imp = match self.imp.as_delegating() {
            Some(delegating) => delegating.new_instance(base),
            None => base,
        };
        Socket::with_impl(imp)
    }

    /// Replaces the implementation, returning the previous one. Streams
    /// acquired from the previous implementation are dropped.
    pub fn set_impl(&mut self, imp: Box<dyn SocketImpl>) -> Box<dyn SocketImpl> {
        self.reader = None;
        self.writer = None;
        self.connected = imp.inet_address().is_some();
        std::mem::replace(&mut self.imp, imp)
    }

    /// The current implementation.
    #[must_use]
    pub fn impl_ref(&self) -> &dyn SocketImpl {
        self.imp.as_ref()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(error::socket_closed())
        } else {
            Ok(())
        }
    }

    /// # Errors
    ///
    /// See [`Socket::connect_timeout`].
    pub fn connect(&mut self, endpoint: impl Into<Endpoint>) -> Result<()> {
        self.connect_timeout(endpoint, None)
    }

    /// Connects, waiting at most `timeout` for the connection to be set up.
    ///
    /// # Errors
    ///
    /// `IllegalState` if already connected, otherwise whatever the
    /// implementation reports.
    pub fn connect_timeout(
        &mut self,
        endpoint: impl Into<Endpoint>,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.check_open()?;
        if self.connected {
            return Err(error::illegal_state("socket is already connected"));
        }

        self.imp.connect(&endpoint.into(), timeout)?;
        self.connected = true;
        self.reader = None;
        self.writer = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Whatever the implementation reports.
    pub fn bind(&mut self, host: IpAddr, port: u16) -> Result<()> {
        self.check_open()?;
        self.imp.bind(host, port)
    }

    /// # Errors
    ///
    /// `InvalidArgument` for a value of the wrong shape, or the
    /// implementation's failure.
    pub fn set_option(&mut self, option: SocketOption, value: impl Into<OptionValue>) -> Result<()> {
        self.check_open()?;
        self.imp.set_option(option, value.into())
    }

    /// # Errors
    ///
    /// Whatever the implementation reports.
    pub fn get_option(&self, option: SocketOption) -> Result<OptionValue> {
        self.check_open()?;
        self.imp.get_option(option)
    }

    /// # Errors
    ///
    /// Fails when not connected or closed.
    pub fn input_stream(&mut self) -> Result<InputStream> {
        self.check_open()?;
        self.imp.input_stream()
    }

    /// # Errors
    ///
    /// Fails when not connected or closed.
    pub fn output_stream(&mut self) -> Result<OutputStream> {
        self.check_open()?;
        self.imp.output_stream()
    }

    /// # Errors
    ///
    /// Fails when not connected or closed.
    pub fn available(&self) -> Result<usize> {
        self.check_open()?;
        self.imp.available()
    }

    /// # Errors
    ///
    /// Fails when not connected or closed.
    pub fn shutdown_input(&mut self) -> Result<()> {
        self.check_open()?;
        self.imp.shutdown_input()
    }

    /// # Errors
    ///
    /// Fails when not connected or closed.
    pub fn shutdown_output(&mut self) -> Result<()> {
        self.check_open()?;
        self.imp.shutdown_output()
    }

    /// # Errors
    ///
    /// Fails when not connected, closed, or urgent data is unsupported.
    pub fn send_urgent_data(&mut self, data: u8) -> Result<()> {
        self.check_open()?;
        self.imp.send_urgent_data(data)
    }

    /// Closes the current implementation. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// The implementation's close failure.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.reader = None;
        self.writer = None;
        self.imp.close()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Remote host; for a tunneled socket the destination, never the proxy.
    #[must_use]
    pub fn inet_address(&self) -> Option<Host> {
        self.imp.inet_address()
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.imp.port()
    }

    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.imp.local_port()
    }

    #[must_use]
    pub fn local_address(&self) -> Option<SocketAddr> {
        self.imp.local_address()
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("imp", &self.imp)
            .field("connected", &self.connected)
            .field("closed", &self.closed)
            .field("reading", &self.reader.is_some())
            .field("writing", &self.writer.is_some())
            .finish_non_exhaustive()
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reader.is_none() {
            self.reader = Some(self.input_stream()?);
        }
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Err(error::not_connected().into()),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.writer.is_none() {
            self.writer = Some(self.output_stream()?);
        }
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(error::not_connected().into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}
