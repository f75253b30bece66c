//! Plain blocking TCP socket implementation
//!
//! The OS socket is created lazily once the address family is known (on bind
//! or connect). Options set before that are kept and applied at creation.

use std::io;
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use super::dns;
use crate::addr::{Endpoint, Host};
use crate::error::{self, Result};
use crate::options::{OptionValue, SocketOption};
use crate::socket::{InputStream, OutputStream, RawDescriptor, SocketImpl};

const AVAILABLE_PEEK_BYTES: usize = 4 * 1024;

/// Socket implementation backed directly by an OS socket.
#[derive(Debug)]
pub struct PlainSocketImpl {
    socket: Option<Socket>,
    stream: bool,
    closed: bool,
    deferred: Vec<(SocketOption, OptionValue)>,
    peer: Option<SocketAddr>,
    peer_host: Option<Host>,
}

impl Default for PlainSocketImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainSocketImpl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            socket: None,
            stream: true,
            closed: false,
            deferred: Vec::new(),
            peer: None,
            peer_host: None,
        }
    }

    fn from_accepted(socket: Socket, peer: Option<SocketAddr>) -> Self {
        Self {
            socket: Some(socket),
            stream: true,
            closed: false,
            deferred: Vec::new(),
            peer,
            peer_host: peer.map(|addr| addr.ip().into()),
        }
    }

    /// Returns true once `connect` (or `accept`) produced a peer.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(error::socket_closed())
        } else {
            Ok(())
        }
    }

    fn open_socket(&mut self, domain: Domain) -> Result<&Socket> {
        if self.socket.is_none() {
            let socket = if self.stream {
                Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?
            } else {
                Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?
            };

            for (option, value) in self.deferred.drain(..) {
                apply_option(&socket, option, value)?;
            }
            self.socket = Some(socket);
        }

        self.socket.as_ref().ok_or_else(error::not_connected)
    }

    fn connected_socket(&self) -> Result<&Socket> {
        self.check_open()?;
        match (&self.socket, self.peer) {
            (Some(socket), Some(_)) => Ok(socket),
            _ => Err(error::not_connected()),
        }
    }

    fn clone_stream(&self) -> Result<TcpStream> {
        let socket = self.connected_socket()?;
        Ok(TcpStream::from(socket.try_clone()?))
    }

    fn bound_family(&self) -> Option<bool> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .and_then(|a| a.as_socket())
            .map(|a| a.is_ipv6())
    }
}

impl SocketImpl for PlainSocketImpl {
    fn create(&mut self, stream: bool) -> Result<()> {
        self.check_open()?;
        self.stream = stream;
        Ok(())
    }

    fn connect(&mut self, endpoint: &Endpoint, timeout: Option<Duration>) -> Result<()> {
        self.check_open()?;
        let Some(target) = endpoint.as_inet() else {
            return Err(error::unsupported_address(endpoint));
        };
        if self.peer.is_some() {
            return Err(io::Error::other("socket is already connected").into());
        }

        let candidates = dns::resolve_endpoint(target)?;
        let addr = match self.bound_family() {
            Some(v6) => candidates.iter().copied().find(|a| a.is_ipv6() == v6),
            None => candidates.first().copied(),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address of the bound family for {target}"),
            )
        })?;

        let socket = self.open_socket(Domain::for_address(addr))?;
        let connected = match error::effective_timeout(timeout) {
            Some(t) => socket.connect_timeout(&addr.into(), t),
            None => socket.connect(&addr.into()),
        };
        if let Err(e) = connected {
            tracing::debug!("Failed to connect to {}: {}", addr, e);
            return Err(e.into());
        }

        self.peer = Some(addr);
        self.peer_host = Some(Host::Resolved {
            ip: addr.ip(),
            name: target.host().name().map(str::to_owned),
        });
        tracing::trace!("connected to {} ({})", target, addr);
        Ok(())
    }

    fn bind(&mut self, host: IpAddr, port: u16) -> Result<()> {
        self.check_open()?;
        let addr = SocketAddr::new(host, port);
        let socket = self.open_socket(Domain::for_address(addr))?;
        socket.bind(&addr.into())?;
        Ok(())
    }

    fn listen(&mut self, backlog: u32) -> Result<()> {
        self.check_open()?;
        let socket = self.socket.as_ref().ok_or_else(|| {
            error::illegal_state("socket must be bound before listening")
        })?;
        socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
        Ok(())
    }

    fn accept(&mut self) -> Result<Box<dyn SocketImpl>> {
        self.check_open()?;
        let socket = self.socket.as_ref().ok_or_else(error::not_connected)?;
        let (accepted, addr) = socket.accept()?;
        Ok(Box::new(PlainSocketImpl::from_accepted(accepted, addr.as_socket())))
    }

    fn input_stream(&mut self) -> Result<InputStream> {
        Ok(Box::new(self.clone_stream()?))
    }

    fn output_stream(&mut self) -> Result<OutputStream> {
        Ok(Box::new(self.clone_stream()?))
    }

    /// Peeks without consuming; the result is capped at
    /// `AVAILABLE_PEEK_BYTES`.
    ///
    /// The non-blocking flag is shared by every handle to the socket, so a
    /// read on another thread that races this call may see `WouldBlock`.
    fn available(&self) -> Result<usize> {
        let peer = self.clone_stream()?;
        peer.set_nonblocking(true)?;
        let mut buf = [0u8; AVAILABLE_PEEK_BYTES];
        let peeked = peer.peek(&mut buf);
        peer.set_nonblocking(false)?;

        match peeked {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.peer = None;
        // dropping the socket releases the descriptor
        self.socket.take();
        Ok(())
    }

    fn shutdown_input(&mut self) -> Result<()> {
        self.connected_socket()?.shutdown(Shutdown::Read)?;
        Ok(())
    }

    fn shutdown_output(&mut self) -> Result<()> {
        self.connected_socket()?.shutdown(Shutdown::Write)?;
        Ok(())
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()> {
        self.check_open()?;
        option.check(&value)?;

        match &self.socket {
            Some(socket) => apply_option(socket, option, value),
            None => {
                self.deferred.retain(|(o, _)| *o != option);
                self.deferred.push((option, value));
                Ok(())
            }
        }
    }

    fn get_option(&self, option: SocketOption) -> Result<OptionValue> {
        self.check_open()?;
        match &self.socket {
            Some(socket) => read_option(socket, option),
            None => self
                .deferred
                .iter()
                .find(|(o, _)| *o == option)
                .map(|(_, v)| *v)
                .ok_or_else(error::not_connected),
        }
    }

    fn supports_urgent_data(&self) -> bool {
        true
    }

    fn send_urgent_data(&mut self, data: u8) -> Result<()> {
        self.connected_socket()?.send_out_of_band(&[data])?;
        Ok(())
    }

    fn inet_address(&self) -> Option<Host> {
        self.peer_host.clone()
    }

    fn port(&self) -> u16 {
        self.peer.map_or(0, |addr| addr.port())
    }

    fn local_port(&self) -> u16 {
        self.local_address().map_or(0, |addr| addr.port())
    }

    fn local_address(&self) -> Option<SocketAddr> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .and_then(|a| a.as_socket())
    }

    fn raw_descriptor(&self) -> Option<RawDescriptor> {
        #[cfg(unix)]
        {
            use std::os::fd::AsRawFd;
            self.socket.as_ref().map(AsRawFd::as_raw_fd)
        }
        #[cfg(windows)]
        {
            use std::os::windows::io::AsRawSocket;
            self.socket.as_ref().map(AsRawSocket::as_raw_socket)
        }
        #[cfg(not(any(unix, windows)))]
        {
            None
        }
    }
}

fn apply_option(socket: &Socket, option: SocketOption, value: OptionValue) -> Result<()> {
    option.check(&value)?;
    match (option, value) {
        (SocketOption::TcpNoDelay, OptionValue::Bool(on)) => socket.set_tcp_nodelay(on)?,
        (SocketOption::SoReuseAddr, OptionValue::Bool(on)) => socket.set_reuse_address(on)?,
        (SocketOption::SoKeepAlive, OptionValue::Bool(on)) => socket.set_keepalive(on)?,
        (SocketOption::SoOobInline, OptionValue::Bool(on)) => socket.set_out_of_band_inline(on)?,
        (SocketOption::SoLinger, OptionValue::Duration(linger)) => socket.set_linger(linger)?,
        (SocketOption::SoTimeout, OptionValue::Duration(timeout)) => {
            socket.set_read_timeout(timeout)?;
        }
        (SocketOption::SoSndBuf, OptionValue::Int(size)) => {
            socket.set_send_buffer_size(size as usize)?;
        }
        (SocketOption::SoRcvBuf, OptionValue::Int(size)) => {
            socket.set_recv_buffer_size(size as usize)?;
        }
        (SocketOption::IpTos, OptionValue::Int(tos)) => socket.set_tos_v4(tos)?,
        (option, value) => {
            return Err(error::invalid_argument(format!(
                "bad value for {option}: {value:?}"
            )));
        }
    }
    Ok(())
}

fn read_option(socket: &Socket, option: SocketOption) -> Result<OptionValue> {
    let value = match option {
        SocketOption::TcpNoDelay => OptionValue::Bool(socket.tcp_nodelay()?),
        SocketOption::SoReuseAddr => OptionValue::Bool(socket.reuse_address()?),
        SocketOption::SoKeepAlive => OptionValue::Bool(socket.keepalive()?),
        SocketOption::SoOobInline => OptionValue::Bool(socket.out_of_band_inline()?),
        SocketOption::SoLinger => OptionValue::Duration(socket.linger()?),
        SocketOption::SoTimeout => OptionValue::Duration(socket.read_timeout()?),
        SocketOption::SoSndBuf => OptionValue::Int(clamp_size(socket.send_buffer_size()?)),
        SocketOption::SoRcvBuf => OptionValue::Int(clamp_size(socket.recv_buffer_size()?)),
        SocketOption::IpTos => OptionValue::Int(socket.tos_v4()?),
    };
    Ok(value)
}

fn clamp_size(size: usize) -> u32 {
    u32::try_from(size).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpListener};
    use std::thread;

    use super::*;

    #[test]
    fn options_before_connect_are_kept() {
        let mut plain = PlainSocketImpl::new();
        plain
            .set_option(SocketOption::SoRcvBuf, OptionValue::Int(65536))
            .expect("deferred");
        assert_eq!(
            plain.get_option(SocketOption::SoRcvBuf).expect("stored"),
            OptionValue::Int(65536)
        );
        assert!(plain.get_option(SocketOption::TcpNoDelay).is_err());
    }

    #[test]
    fn connects_and_exchanges_bytes() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().expect("accept");
            let mut buf = [0u8; 4];
            conn.read_exact(&mut buf).expect("read");
            conn.write_all(&buf).expect("echo");
        });

        let mut plain = PlainSocketImpl::new();
        plain.create(true).expect("create");
        plain
            .set_option(SocketOption::TcpNoDelay, OptionValue::Bool(true))
            .expect("nodelay");
        plain
            .connect(&Endpoint::inet("127.0.0.1", port), Some(Duration::from_secs(5)))
            .expect("connect");
        assert_eq!(plain.port(), port);
        assert_ne!(plain.local_port(), 0);
        assert_eq!(
            plain.get_option(SocketOption::TcpNoDelay).expect("read back"),
            OptionValue::Bool(true)
        );

        plain.output_stream().expect("out").write_all(b"ping").expect("write");
        let mut echoed = [0u8; 4];
        plain.input_stream().expect("in").read_exact(&mut echoed).expect("read");
        assert_eq!(&echoed, b"ping");

        server.join().expect("server thread");
        plain.close().expect("close");
        assert!(plain.input_stream().is_err());
    }

    #[test]
    fn available_counts_without_consuming() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().expect("accept");
            conn.write_all(b"ready").expect("write");
            let mut done = [0u8; 1];
            let _ = conn.read(&mut done);
        });

        let mut plain = PlainSocketImpl::new();
        plain
            .connect(&Endpoint::inet("127.0.0.1", port), Some(Duration::from_secs(5)))
            .expect("connect");
        let mut input = plain.input_stream().expect("in");

        let mut waited = 0;
        while plain.available().expect("available") < 5 && waited < 100 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        assert_eq!(plain.available().expect("available"), 5);

        let mut buf = [0u8; 5];
        input.read_exact(&mut buf).expect("blocking read still works");
        assert_eq!(&buf, b"ready");
        assert_eq!(plain.available().expect("drained"), 0);

        plain.output_stream().expect("out").write_all(b"x").expect("finish");
        server.join().expect("server thread");
    }

    #[test]
    fn unix_endpoints_are_rejected() {
        let mut plain = PlainSocketImpl::new();
        let err = plain
            .connect(&Endpoint::Unix("/tmp/none.sock".into()), None)
            .expect_err("not inet");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn closed_socket_rejects_operations() {
        let mut plain = PlainSocketImpl::new();
        plain.close().expect("close");
        plain.close().expect("close twice");
        let err = plain
            .set_option(SocketOption::TcpNoDelay, OptionValue::Bool(true))
            .expect_err("closed");
        assert!(err.is_io());
    }
}
