//! Socket implementation that tunnels through an HTTP proxy
//!
//! `TunnelingSocket` starts out forwarding to a plain, not yet connected
//! implementation. On `connect` it asks its tunneler for an HTTP CONNECT
//! tunnel to the destination and, once the tunnel is up, closes the original
//! implementation and forwards everything to the tunnel's connection for the
//! rest of its life. Options set before that point are replayed onto the
//! tunnel's connection on a best-effort basis.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;

use super::builder::TunnelingSocketBuilder;
use super::imp::{DelegatingImpl, InputStream, OutputStream, RawDescriptor, SocketImpl};
use crate::addr::{Endpoint, Host, InetSocketAddr};
use crate::connect::tunnel::{TunnelRequest, Tunneler};
use crate::error::{self, Error, Result};
use crate::options::{OptionValue, SocketOption};
use crate::proxy::NoProxy;
use crate::security::ConnectPolicy;

/// Outbound socket implementation that may swap its delegate for an HTTP
/// CONNECT tunnel at connect time.
pub struct TunnelingSocket {
    proxy_host: String,
    proxy_port: u16,
    delegate: Box<dyn SocketImpl>,
    /// Set once, on a successful tunnel; the logical remote peer.
    external_address: Option<InetSocketAddr>,
    /// Written only while `external_address` is `None`.
    pending_options: HashMap<SocketOption, OptionValue>,
    replay_failures: Vec<SocketOption>,
    connected_direct: bool,
    tunneler: Arc<dyn Tunneler>,
    policy: Arc<dyn ConnectPolicy>,
    bypass: Option<NoProxy>,
}

impl TunnelingSocket {
    /// Tunneling socket for `proxy`, forwarding to `delegate` until connect.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `proxy` is not a host and port.
    pub fn new(
        proxy: &Endpoint,
        delegate: Box<dyn SocketImpl>,
        tunneler: Arc<dyn Tunneler>,
    ) -> Result<Self> {
        Self::builder(proxy.clone())
            .tunneler(tunneler)
            .build(delegate)
    }

    #[must_use]
    pub fn builder(proxy: Endpoint) -> TunnelingSocketBuilder {
        TunnelingSocketBuilder::new(proxy)
    }

    pub(crate) fn from_parts(
        proxy: &InetSocketAddr,
        delegate: Box<dyn SocketImpl>,
        tunneler: Arc<dyn Tunneler>,
        policy: Arc<dyn ConnectPolicy>,
        bypass: Option<NoProxy>,
    ) -> Self {
        Self {
            proxy_host: proxy.host_string(),
            proxy_port: proxy.port(),
            delegate,
            external_address: None,
            pending_options: HashMap::new(),
            replay_failures: Vec::new(),
            connected_direct: false,
            tunneler,
            policy,
            bypass,
        }
    }

    #[must_use]
    pub fn proxy_host(&self) -> &str {
        &self.proxy_host
    }

    #[must_use]
    pub fn proxy_port(&self) -> u16 {
        self.proxy_port
    }

    /// Destination of the established tunnel, `None` before tunneling.
    #[must_use]
    pub fn external_address(&self) -> Option<&InetSocketAddr> {
        self.external_address.as_ref()
    }

    #[must_use]
    pub fn is_tunneled(&self) -> bool {
        self.external_address.is_some()
    }

    /// Options recorded before the tunnel came up.
    #[must_use]
    pub fn pending_options(&self) -> &HashMap<SocketOption, OptionValue> {
        &self.pending_options
    }

    /// Options that could not be reapplied to the tunnel's connection.
    #[must_use]
    pub fn replay_failures(&self) -> &[SocketOption] {
        &self.replay_failures
    }

    fn recorded_read_timeout(&self) -> Option<Duration> {
        match self.pending_options.get(&SocketOption::SoTimeout) {
            Some(OptionValue::Duration(Some(timeout))) if !timeout.is_zero() => Some(*timeout),
            _ => None,
        }
    }

    fn bypasses_proxy(&self, target: &InetSocketAddr) -> bool {
        let Some(rules) = &self.bypass else {
            return false;
        };
        rules.matches(&target.destination_host())
            || target.host().name().is_some_and(|name| rules.matches(name))
    }

    fn replay_pending_options(&mut self) {
        for (option, value) in &self.pending_options {
            if let Err(e) = self.delegate.set_option(*option, *value) {
                tracing::debug!("could not reapply {} to tunneled connection: {}", option, e);
                self.replay_failures.push(*option);
            }
        }
    }

    fn swap_to_tunnel(&mut self, target: InetSocketAddr, tunneled: Box<dyn SocketImpl>) {
        self.external_address = Some(target);

        if let Err(e) = self.delegate.close() {
            tracing::debug!("closing pre-tunnel socket failed: {}", e);
        }
        let original = std::mem::replace(&mut self.delegate, tunneled);
        drop(original);

        self.replay_pending_options();
    }
}

impl SocketImpl for TunnelingSocket {
    fn create(&mut self, stream: bool) -> Result<()> {
        self.delegate.create(stream)
    }

    fn connect(&mut self, endpoint: &Endpoint, timeout: Option<Duration>) -> Result<()> {
        if self.external_address.is_some() || self.connected_direct {
            return Err(error::illegal_state("socket is already connected"));
        }
        let Some(target) = endpoint.as_inet() else {
            return Err(error::unsupported_address(endpoint));
        };

        let timeout = error::effective_timeout(timeout);

        let destination_host = target.destination_host();
        let destination_port = target.port();
        self.policy
            .check_connect(&destination_host, destination_port)
            .map_err(|e| {
                if e.is_permission_denied() {
                    e
                } else {
                    error::permission_denied(e)
                }
            })?;

        if self.bypasses_proxy(target) {
            tracing::debug!("{} matches no-proxy rules, connecting directly", target);
            self.delegate.connect(endpoint, timeout)?;
            self.connected_direct = true;
            return Ok(());
        }

        let request = TunnelRequest {
            proxy_host: self.proxy_host.clone(),
            proxy_port: self.proxy_port,
            destination_host,
            destination_port,
            connect_timeout: timeout,
            read_timeout: self.recorded_read_timeout(),
        };
        tracing::debug!(
            "tunneling to {} through {}:{}",
            request.target_url(),
            self.proxy_host,
            self.proxy_port
        );

        let connection = self
            .tunneler
            .tunnel(&request)
            .map_err(|e| Error::from(e).with_endpoint(endpoint.clone()))?;

        self.swap_to_tunnel(target.clone(), connection.into_socket_impl());
        tracing::debug!(
            "tunnel to {} established, {} option(s) replayed, {} failed",
            target,
            self.pending_options.len(),
            self.replay_failures.len()
        );
        Ok(())
    }

    fn bind(&mut self, host: IpAddr, port: u16) -> Result<()> {
        self.delegate.bind(host, port)
    }

    fn listen(&mut self, _backlog: u32) -> Result<()> {
        Err(error::not_a_server_socket())
    }

    fn accept(&mut self) -> Result<Box<dyn SocketImpl>> {
        Err(error::not_a_server_socket())
    }

    fn input_stream(&mut self) -> Result<InputStream> {
        self.delegate.input_stream()
    }

    fn output_stream(&mut self) -> Result<OutputStream> {
        self.delegate.output_stream()
    }

    fn available(&self) -> Result<usize> {
        self.delegate.available()
    }

    fn close(&mut self) -> Result<()> {
        self.delegate.close()
    }

    fn shutdown_input(&mut self) -> Result<()> {
        self.delegate.shutdown_input()
    }

    fn shutdown_output(&mut self) -> Result<()> {
        self.delegate.shutdown_output()
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()> {
        self.delegate.set_option(option, value)?;

        if self.external_address.is_some() {
            return Ok(());
        }

        self.pending_options.insert(option, value);
        Ok(())
    }

    fn get_option(&self, option: SocketOption) -> Result<OptionValue> {
        self.delegate.get_option(option)
    }

    fn supported_options(&self) -> Vec<SocketOption> {
        self.delegate.supported_options()
    }

    fn supports_urgent_data(&self) -> bool {
        self.delegate.supports_urgent_data()
    }

    fn send_urgent_data(&mut self, data: u8) -> Result<()> {
        self.delegate.send_urgent_data(data)
    }

    fn inet_address(&self) -> Option<Host> {
        match &self.external_address {
            Some(external) => Some(external.host().clone()),
            None => self.delegate.inet_address(),
        }
    }

    fn port(&self) -> u16 {
        match &self.external_address {
            Some(external) => external.port(),
            None => self.delegate.port(),
        }
    }

    fn local_port(&self) -> u16 {
        self.delegate.local_port()
    }

    fn local_address(&self) -> Option<SocketAddr> {
        self.delegate.local_address()
    }

    fn raw_descriptor(&self) -> Option<RawDescriptor> {
        self.delegate.raw_descriptor()
    }

    fn as_delegating(&self) -> Option<&dyn DelegatingImpl> {
        Some(self)
    }
}

impl DelegatingImpl for TunnelingSocket {
    fn delegate(&self) -> &dyn SocketImpl {
        self.delegate.as_ref()
    }

    fn new_instance(&self, base: Box<dyn SocketImpl>) -> Box<dyn SocketImpl> {
        let proxy = InetSocketAddr::new(self.proxy_host.clone(), self.proxy_port);
        Box::new(TunnelingSocket::from_parts(
            &proxy,
            base,
            Arc::clone(&self.tunneler),
            Arc::clone(&self.policy),
            self.bypass.clone(),
        ))
    }
}

impl fmt::Debug for TunnelingSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelingSocket")
            .field("proxy", &format_args!("{}:{}", self.proxy_host, self.proxy_port))
            .field("external_address", &self.external_address)
            .field("pending_options", &self.pending_options.len())
            .field("connected_direct", &self.connected_direct)
            .field("delegate", &self.delegate)
            .finish_non_exhaustive()
    }
}
