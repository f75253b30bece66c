//! Configuration validation

use http::header::{HeaderMap, HeaderName, HeaderValue};

use super::tunnel_config::TunnelConfig;
use crate::error;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid header limit: {0}")]
    InvalidHeaderLimit(String),

    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid proxy URL: {0}")]
    InvalidProxyUrl(String),
}

impl From<ConfigurationError> for error::Error {
    fn from(e: ConfigurationError) -> Self {
        error::invalid_argument(e)
    }
}

impl TunnelConfig {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// - `InvalidHeaderLimit` if the response head limit is below 16 bytes
    /// - `InvalidTimeout` if the connect timeout is zero
    /// - `InvalidHeader` if a user agent or extra header is not valid HTTP
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_response_header_bytes < 16 {
            return Err(ConfigurationError::InvalidHeaderLimit(format!(
                "{} bytes cannot hold a status line",
                self.max_response_header_bytes
            )));
        }

        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigurationError::InvalidTimeout(
                "connect timeout cannot be zero; leave it unset to wait indefinitely".into(),
            ));
        }

        self.header_map().map(|_| ())
    }

    /// Extra headers, plus `User-Agent`, as a validated header map.
    ///
    /// # Errors
    ///
    /// `InvalidHeader` for a name or value that is not valid HTTP.
    pub fn header_map(&self) -> ConfigResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(user_agent) = &self.user_agent {
            headers.insert(http::header::USER_AGENT, parse_value("user-agent", user_agent)?);
        }

        for (name, value) in &self.extra_headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigurationError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.append(header_name, parse_value(name, value)?);
        }

        Ok(headers)
    }
}

fn parse_value(name: &str, value: &str) -> ConfigResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ConfigurationError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
