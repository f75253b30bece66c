//! Tunnel configuration
//!
//! `TunnelConfig` carries the settings of the HTTP CONNECT exchange. It can
//! be built in code with the `with_*` methods or deserialized with serde.

pub mod tunnel_config;
pub mod validation;

pub use tunnel_config::{DEFAULT_MAX_RESPONSE_HEADER_BYTES, TunnelConfig};
pub use validation::{ConfigResult, ConfigurationError};
