//! Builder for tunneling sockets

use std::fmt;
use std::sync::Arc;

use super::imp::SocketImpl;
use super::tunneling::TunnelingSocket;
use crate::addr::Endpoint;
use crate::connect::tunnel::{HttpConnectTunneler, Tunneler};
use crate::error::{self, Result};
use crate::proxy::NoProxy;
use crate::security::{AllowAll, ConnectPolicy};

/// Configures a [`TunnelingSocket`] before it wraps its base implementation.
///
/// Defaults: an [`HttpConnectTunneler`] with default configuration, the
/// [`AllowAll`] policy and no bypass rules.
pub struct TunnelingSocketBuilder {
    proxy: Endpoint,
    tunneler: Option<Arc<dyn Tunneler>>,
    policy: Arc<dyn ConnectPolicy>,
    bypass: Option<NoProxy>,
}

impl TunnelingSocketBuilder {
    pub(crate) fn new(proxy: Endpoint) -> Self {
        Self {
            proxy,
            tunneler: None,
            policy: Arc::new(AllowAll),
            bypass: None,
        }
    }

    /// Collaborator that performs the CONNECT exchange.
    #[must_use]
    pub fn tunneler(mut self, tunneler: Arc<dyn Tunneler>) -> Self {
        self.tunneler = Some(tunneler);
        self
    }

    /// Policy consulted before every connect.
    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn ConnectPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Destinations that connect directly through the base implementation.
    #[must_use]
    pub fn no_proxy(mut self, bypass: Option<NoProxy>) -> Self {
        self.bypass = bypass;
        self
    }

    /// Wraps `delegate`. No network activity happens here.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the proxy endpoint is not a host and port.
    pub fn build(self, delegate: Box<dyn SocketImpl>) -> Result<TunnelingSocket> {
        let Some(proxy) = self.proxy.as_inet() else {
            return Err(error::unsupported_address(&self.proxy));
        };

        let tunneler = self
            .tunneler
            .unwrap_or_else(|| Arc::new(HttpConnectTunneler::default()));

        Ok(TunnelingSocket::from_parts(
            proxy,
            delegate,
            tunneler,
            self.policy,
            self.bypass,
        ))
    }
}

impl fmt::Debug for TunnelingSocketBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelingSocketBuilder")
            .field("proxy", &self.proxy)
            .field("custom_tunneler", &self.tunneler.is_some())
            .field("bypass", &self.bypass)
            .finish_non_exhaustive()
    }
}
