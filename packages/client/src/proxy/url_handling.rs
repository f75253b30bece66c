//! Proxy URL parsing and environment discovery

use std::env;

use url::Url;

use super::types::{Proxy, ProxyCredentials};
use crate::addr::Endpoint;
use crate::config::ConfigurationError;
use crate::error::Result;

impl Proxy {
    /// Parses `http://[user[:password]@]host[:port]`.
    ///
    /// The port defaults to 80. Percent-encoded credentials are decoded.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unparsable URLs, a scheme other than `http`, or a
    /// URL without a host.
    pub fn from_url(raw: &str) -> Result<Proxy> {
        let url = Url::parse(raw)
            .map_err(|e| ConfigurationError::InvalidProxyUrl(format!("{raw}: {e}")))?;

        if url.scheme() != "http" {
            return Err(ConfigurationError::InvalidProxyUrl(format!(
                "unsupported proxy scheme {:?}; only http forward proxies are supported",
                url.scheme()
            ))
            .into());
        }

        let host = url
            .host_str()
            .ok_or_else(|| ConfigurationError::InvalidProxyUrl(format!("{raw}: missing host")))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let credentials = if url.username().is_empty() {
            None
        } else {
            let username = decode(url.username())?;
            let password = decode(url.password().unwrap_or_default())?;
            Some(ProxyCredentials::new(username, password))
        };

        Ok(Proxy::Http {
            endpoint: Endpoint::inet(host, port),
            credentials,
        })
    }

    /// Proxy from `HTTPS_PROXY`, `HTTP_PROXY` or `ALL_PROXY` (upper case
    /// first, then lower case). `NoProxy` when none is set or parsable.
    #[must_use]
    pub fn from_env() -> Proxy {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Proxy {
        ["HTTPS_PROXY", "HTTP_PROXY", "ALL_PROXY"]
            .iter()
            .filter_map(|name| env_value(name, &lookup))
            .find_map(|value| match Proxy::from_url(&value) {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    tracing::warn!(target: "connect_tunnel::proxy", "ignoring proxy from environment: {}", e);
                    None
                }
            })
            .unwrap_or(Proxy::NoProxy)
    }
}

/// First non-blank value of `name`, then of its lower-case form.
pub(crate) fn env_value(name: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    [name.to_owned(), name.to_lowercase()]
        .iter()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

fn decode(component: &str) -> Result<String> {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ConfigurationError::InvalidProxyUrl(format!("bad credentials encoding: {e}")).into())
}
