//! HTTP CONNECT tunnel establishment
//!
//! Opens a plain TCP connection to the proxy, sends `CONNECT host:port`, and
//! hands the connection back once the proxy answers with a 2xx status.

use std::io::{self, Write};

use http::header::HeaderMap;

use super::response::{ResponseHead, read_response_head};
use super::{TunnelConnection, TunnelRequest, Tunneler};
use crate::addr::Endpoint;
use crate::config::TunnelConfig;
use crate::connect::tcp::PlainSocketImpl;
use crate::error::{self, Result};
use crate::options::{OptionValue, SocketOption};
use crate::proxy::ProxyCredentials;
use crate::socket::SocketImpl;

/// Tunneler speaking HTTP/1.1 CONNECT over a plain TCP connection.
#[derive(Debug, Clone)]
pub struct HttpConnectTunneler {
    config: TunnelConfig,
    headers: HeaderMap,
    credentials: Option<ProxyCredentials>,
}

impl Default for HttpConnectTunneler {
    fn default() -> Self {
        let config = TunnelConfig::default();
        let headers = config.header_map().unwrap_or_default();
        Self {
            config,
            headers,
            credentials: None,
        }
    }
}

impl HttpConnectTunneler {
    /// Builds a tunneler from validated configuration.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the configuration fails validation.
    pub fn new(config: TunnelConfig) -> Result<Self> {
        config.validate()?;
        let headers = config.header_map()?;
        Ok(Self {
            config,
            headers,
            credentials: None,
        })
    }

    /// Send Basic `Proxy-Authorization` with every CONNECT.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<ProxyCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    /// Serialized CONNECT request head.
    #[must_use]
    pub fn request_head(&self, request: &TunnelRequest) -> Vec<u8> {
        let authority = request.authority();
        let mut head = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n").into_bytes();

        let proxy_authorization = http::header::PROXY_AUTHORIZATION;
        let auth = self
            .credentials
            .as_ref()
            .and_then(ProxyCredentials::basic_auth_header);
        let headers = self
            .headers
            .iter()
            .chain(auth.iter().map(|v| (&proxy_authorization, v)));

        for (name, value) in headers {
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"Proxy-Connection: keep-alive\r\n\r\n");
        head
    }

    fn open(&self, request: &TunnelRequest) -> Result<PlainSocketImpl> {
        let mut socket = PlainSocketImpl::new();
        socket.create(true)?;
        if let Some(read_timeout) = request.read_timeout {
            socket.set_option(SocketOption::SoTimeout, OptionValue::Duration(Some(read_timeout)))?;
        }

        let proxy = Endpoint::inet(request.proxy_host.clone(), request.proxy_port);
        let timeout = error::effective_timeout(request.connect_timeout).or(self.config.connect_timeout);
        socket.connect(&proxy, timeout)?;
        Ok(socket)
    }

    fn exchange(&self, socket: &mut PlainSocketImpl, request: &TunnelRequest) -> Result<ResponseHead> {
        let mut output = socket.output_stream()?;
        output.write_all(&self.request_head(request))?;
        output.flush()?;

        let mut input = socket.input_stream()?;
        Ok(read_response_head(&mut input, self.config.max_response_header_bytes)?)
    }
}

impl Tunneler for HttpConnectTunneler {
    fn tunnel(&self, request: &TunnelRequest) -> io::Result<TunnelConnection> {
        let mut socket = self.open(request).map_err(crate::Error::into_io)?;

        tracing::debug!(
            "CONNECT {} via proxy {}:{}",
            request.authority(),
            request.proxy_host,
            request.proxy_port
        );

        let head = match self.exchange(&mut socket, request) {
            Ok(head) => head,
            Err(e) => {
                let _ = socket.close();
                return Err(e.into_io());
            }
        };

        tracing::debug!("proxy answered CONNECT with {}", head.status_line);
        if !head.status.is_success() {
            let _ = socket.close();
            return Err(head.refusal());
        }

        Ok(TunnelConnection::new(Box::new(socket)).with_status(head.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(host: &str, port: u16) -> TunnelRequest {
        TunnelRequest {
            proxy_host: "proxy.local".into(),
            proxy_port: 8080,
            destination_host: host.into(),
            destination_port: port,
            connect_timeout: None,
            read_timeout: None,
        }
    }

    #[test]
    fn request_head_has_connect_line_and_host() {
        let tunneler = HttpConnectTunneler::new(TunnelConfig::default().with_user_agent(None))
            .expect("valid config");
        let head = String::from_utf8(tunneler.request_head(&request("example.org", 443))).expect("utf8");
        assert!(head.starts_with("CONNECT example.org:443 HTTP/1.1\r\nHost: example.org:443\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
        assert!(!head.contains("proxy-authorization"));
    }

    #[test]
    fn ipv6_destinations_are_bracketed() {
        let tunneler = HttpConnectTunneler::default();
        let head = String::from_utf8(tunneler.request_head(&request("::1", 8443))).expect("utf8");
        assert!(head.starts_with("CONNECT [::1]:8443 HTTP/1.1\r\n"));
    }

    #[test]
    fn credentials_add_basic_auth() {
        let tunneler = HttpConnectTunneler::default()
            .with_credentials(Some(ProxyCredentials::new("alice", "secret")));
        let head = String::from_utf8(tunneler.request_head(&request("example.org", 443))).expect("utf8");
        // base64("alice:secret")
        assert!(head.contains("proxy-authorization: Basic YWxpY2U6c2VjcmV0\r\n"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = HttpConnectTunneler::new(TunnelConfig::default().with_max_response_header_bytes(1))
            .expect_err("too small");
        assert!(err.is_invalid_argument());
    }
}
