//! Proxy selection types

use std::fmt;

use base64::Engine;
use http::header::HeaderValue;

use crate::addr::Endpoint;

/// How a socket reaches its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proxy {
    /// Connect directly
    NoProxy,
    /// Tunnel through a forward HTTP proxy with CONNECT
    Http {
        endpoint: Endpoint,
        credentials: Option<ProxyCredentials>,
    },
}

impl Proxy {
    /// HTTP proxy at `host:port` without credentials.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Proxy::Http {
            endpoint: Endpoint::inet(host, port),
            credentials: None,
        }
    }

    /// Attach Basic credentials. No effect on `NoProxy`.
    #[must_use]
    pub fn with_credentials(self, credentials: ProxyCredentials) -> Self {
        match self {
            Proxy::Http { endpoint, .. } => Proxy::Http {
                endpoint,
                credentials: Some(credentials),
            },
            Proxy::NoProxy => Proxy::NoProxy,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Proxy::Http { endpoint, .. } => Some(endpoint),
            Proxy::NoProxy => None,
        }
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        match self {
            Proxy::Http { credentials, .. } => credentials.as_ref(),
            Proxy::NoProxy => None,
        }
    }
}

/// Username and password for Basic proxy authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    username: String,
    password: String,
}

impl ProxyCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Proxy-Authorization` value, marked sensitive so it stays out of logs.
    ///
    /// Returns `None` if the encoded value is not a valid header value,
    /// which cannot happen for base64 output.
    #[must_use]
    pub fn basic_auth_header(&self) -> Option<HeaderValue> {
        let credentials = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}")).ok()?;
        value.set_sensitive(true);
        Some(value)
    }
}

impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
