//! Socket option keys and values

use std::fmt;
use std::time::Duration;

use crate::error::{self, Result};

/// Socket option understood by socket implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SocketOption {
    /// Disable Nagle's algorithm (`TCP_NODELAY`)
    TcpNoDelay,
    /// `SO_REUSEADDR`
    SoReuseAddr,
    /// `SO_KEEPALIVE`
    SoKeepAlive,
    /// Receive urgent data inline (`SO_OOBINLINE`)
    SoOobInline,
    /// Linger on close; `None` disables
    SoLinger,
    /// Blocking read timeout; `None` waits indefinitely
    SoTimeout,
    /// Send buffer size in bytes
    SoSndBuf,
    /// Receive buffer size in bytes
    SoRcvBuf,
    /// IPv4 type-of-service byte
    IpTos,
}

impl SocketOption {
    pub const ALL: [SocketOption; 9] = [
        SocketOption::TcpNoDelay,
        SocketOption::SoReuseAddr,
        SocketOption::SoKeepAlive,
        SocketOption::SoOobInline,
        SocketOption::SoLinger,
        SocketOption::SoTimeout,
        SocketOption::SoSndBuf,
        SocketOption::SoRcvBuf,
        SocketOption::IpTos,
    ];

    /// Checks that `value` has the shape this option takes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on a type mismatch, a zero buffer size or a TOS
    /// value above 255.
    pub fn check(self, value: &OptionValue) -> Result<()> {
        match (self, value) {
            (
                SocketOption::TcpNoDelay
                | SocketOption::SoReuseAddr
                | SocketOption::SoKeepAlive
                | SocketOption::SoOobInline,
                OptionValue::Bool(_),
            )
            | (SocketOption::SoLinger | SocketOption::SoTimeout, OptionValue::Duration(_)) => Ok(()),
            (SocketOption::SoSndBuf | SocketOption::SoRcvBuf, OptionValue::Int(size)) => {
                if *size == 0 {
                    Err(error::invalid_argument(format!("{self} must be positive")))
                } else {
                    Ok(())
                }
            }
            (SocketOption::IpTos, OptionValue::Int(tos)) => {
                if *tos > 255 {
                    Err(error::invalid_argument(format!("{self} out of range: {tos}")))
                } else {
                    Ok(())
                }
            }
            (option, value) => Err(error::invalid_argument(format!(
                "bad value for {option}: {value:?}"
            ))),
        }
    }
}

impl fmt::Display for SocketOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SocketOption::TcpNoDelay => "TCP_NODELAY",
            SocketOption::SoReuseAddr => "SO_REUSEADDR",
            SocketOption::SoKeepAlive => "SO_KEEPALIVE",
            SocketOption::SoOobInline => "SO_OOBINLINE",
            SocketOption::SoLinger => "SO_LINGER",
            SocketOption::SoTimeout => "SO_TIMEOUT",
            SocketOption::SoSndBuf => "SO_SNDBUF",
            SocketOption::SoRcvBuf => "SO_RCVBUF",
            SocketOption::IpTos => "IP_TOS",
        })
    }
}

/// Value of a socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(u32),
    Duration(Option<Duration>),
}

impl OptionValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<u32> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<Option<Duration>> {
        match self {
            OptionValue::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(value)
    }
}

impl From<Option<Duration>> for OptionValue {
    fn from(value: Option<Duration>) -> Self {
        OptionValue::Duration(value)
    }
}

impl From<Duration> for OptionValue {
    fn from(value: Duration) -> Self {
        OptionValue::Duration((!value.is_zero()).then_some(value))
    }
}
