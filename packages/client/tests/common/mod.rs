#![allow(dead_code)]

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use connect_tunnel::addr::{Endpoint, Host, InetSocketAddr};
use connect_tunnel::connect::tunnel::{TunnelConnection, TunnelRequest, Tunneler};
use connect_tunnel::error::{self, Result};
use connect_tunnel::options::{OptionValue, SocketOption};
use connect_tunnel::socket::{InputStream, OutputStream, RawDescriptor, SocketImpl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create,
    Connect(Endpoint),
    Bind,
    Listen,
    Accept,
    Close,
    SetOption(SocketOption, OptionValue),
}

/// Shared view of what a `SpyImpl` was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("recorder lock").clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn closes(&self) -> usize {
        self.count(&Event::Close)
    }

    pub fn option_sets(&self, option: SocketOption) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::SetOption(o, _) if *o == option))
            .count()
    }

    fn record(&self, event: Event) {
        self.events.lock().expect("recorder lock").push(event);
    }
}

/// Socket implementation that records calls instead of touching the network.
#[derive(Debug)]
pub struct SpyImpl {
    recorder: Recorder,
    rejected: Vec<SocketOption>,
    peer: Option<InetSocketAddr>,
}

impl SpyImpl {
    pub fn new() -> (Self, Recorder) {
        let recorder = Recorder::default();
        (
            Self {
                recorder: recorder.clone(),
                rejected: Vec::new(),
                peer: None,
            },
            recorder,
        )
    }

    /// `set_option` fails for these options.
    pub fn rejecting(mut self, options: &[SocketOption]) -> Self {
        self.rejected = options.to_vec();
        self
    }

    /// Pretends to already be connected to `peer`.
    pub fn connected_to(mut self, peer: InetSocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn boxed(self) -> Box<dyn SocketImpl> {
        Box::new(self)
    }
}

impl SocketImpl for SpyImpl {
    fn create(&mut self, _stream: bool) -> Result<()> {
        self.recorder.record(Event::Create);
        Ok(())
    }

    fn connect(&mut self, endpoint: &Endpoint, _timeout: Option<Duration>) -> Result<()> {
        self.recorder.record(Event::Connect(endpoint.clone()));
        self.peer = endpoint.as_inet().cloned();
        Ok(())
    }

    fn bind(&mut self, _host: IpAddr, _port: u16) -> Result<()> {
        self.recorder.record(Event::Bind);
        Ok(())
    }

    fn listen(&mut self, _backlog: u32) -> Result<()> {
        self.recorder.record(Event::Listen);
        Ok(())
    }

    fn accept(&mut self) -> Result<Box<dyn SocketImpl>> {
        self.recorder.record(Event::Accept);
        Ok(SpyImpl::new().0.boxed())
    }

    fn input_stream(&mut self) -> Result<InputStream> {
        Ok(Box::new(io::Cursor::new(b"spy".to_vec())))
    }

    fn output_stream(&mut self) -> Result<OutputStream> {
        Ok(Box::new(io::sink()))
    }

    fn available(&self) -> Result<usize> {
        Ok(0)
    }

    fn close(&mut self) -> Result<()> {
        self.recorder.record(Event::Close);
        Ok(())
    }

    fn shutdown_input(&mut self) -> Result<()> {
        Ok(())
    }

    fn shutdown_output(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()> {
        self.recorder.record(Event::SetOption(option, value));
        if self.rejected.contains(&option) {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "option not supported by spy").into());
        }
        Ok(())
    }

    fn get_option(&self, _option: SocketOption) -> Result<OptionValue> {
        Err(error::not_connected())
    }

    fn send_urgent_data(&mut self, _data: u8) -> Result<()> {
        Ok(())
    }

    fn inet_address(&self) -> Option<Host> {
        self.peer.as_ref().map(|p| p.host().clone())
    }

    fn port(&self) -> u16 {
        self.peer.as_ref().map_or(0, InetSocketAddr::port)
    }

    fn local_port(&self) -> u16 {
        0
    }

    fn local_address(&self) -> Option<SocketAddr> {
        None
    }

    fn raw_descriptor(&self) -> Option<RawDescriptor> {
        None
    }
}

/// Tunneler that hands out prepared implementations and records requests.
#[derive(Default)]
pub struct FakeTunnel {
    next: Mutex<Vec<Box<dyn SocketImpl>>>,
    requests: Mutex<Vec<TunnelRequest>>,
    failure: Option<io::ErrorKind>,
}

impl FakeTunnel {
    /// Each successful tunnel returns the next of `connections`, in order.
    pub fn returning(connections: Vec<Box<dyn SocketImpl>>) -> Arc<Self> {
        let mut next = connections;
        next.reverse();
        Arc::new(Self {
            next: Mutex::new(next),
            ..Self::default()
        })
    }

    pub fn failing(kind: io::ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(kind),
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<TunnelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Tunneler for FakeTunnel {
    fn tunnel(&self, request: &TunnelRequest) -> io::Result<TunnelConnection> {
        self.requests.lock().expect("requests lock").push(request.clone());
        if let Some(kind) = self.failure {
            return Err(io::Error::new(kind, "fake tunnel refused"));
        }
        let socket = self
            .next
            .lock()
            .expect("next lock")
            .pop()
            .ok_or_else(|| io::Error::other("fake tunnel exhausted"))?;
        Ok(TunnelConnection::new(socket))
    }
}

pub fn proxy() -> Endpoint {
    Endpoint::inet("proxy.local", 8080)
}

pub fn destination() -> Endpoint {
    Endpoint::inet("example.org", 443)
}

pub fn host_name(host: Option<Host>) -> Option<String> {
    host.and_then(|h| h.name().map(str::to_owned))
}

/// One-shot loopback proxy. Reads a CONNECT head, answers with `response`
/// and, when `echo` is set, echoes tunneled bytes until the client closes.
/// The join handle yields the request head as received.
pub fn fake_proxy(response: &'static [u8], echo: bool) -> (u16, std::thread::JoinHandle<String>) {
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpListener};

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind fake proxy");
    let port = listener.local_addr().expect("fake proxy addr").port();

    let handle = std::thread::spawn(move || {
        let (mut conn, _) = listener.accept().expect("accept client");
        let mut head = Vec::new();
        let mut chunk = [0u8; 512];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = conn.read(&mut chunk).expect("read request head");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }
        conn.write_all(response).expect("write response");

        if echo {
            loop {
                match conn.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if conn.write_all(&chunk[..n]).is_err() {
                            break;
                        }
                    }
                }
            }
        }
        String::from_utf8(head).expect("request head is utf8")
    });

    (port, handle)
}

/// Routes `tracing` output to the test harness; `RUST_LOG` selects levels.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
