//! Parsing of user-supplied server addresses.

use std::fmt;
use std::str::FromStr;

use crate::TransportError;

/// Where to connect, and over which transport.
///
/// | Input | Endpoint |
/// |---|---|
/// | `127.0.0.1:2396`, `tcp://host:2396` | [`Endpoint::Tcp`] |
/// | `ws://host:8080/game`, `wss://…` | [`Endpoint::WebSocket`] |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `host:port` for a length-prefixed TCP stream.
    Tcp(String),
    /// Full `ws://` or `wss://` URL.
    WebSocket(String),
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("ws://") || s.starts_with("wss://") {
            return Ok(Self::WebSocket(s.to_string()));
        }

        let addr = s.strip_prefix("tcp://").unwrap_or(s);
        let Some((host, port)) = addr.rsplit_once(':') else {
            return Err(TransportError::InvalidAddress(format!("{s}: expected host:port")));
        };
        if host.is_empty() {
            return Err(TransportError::InvalidAddress(format!("{s}: missing host")));
        }
        if port.parse::<u16>().is_err() {
            return Err(TransportError::InvalidAddress(format!("{s}: bad port {port:?}")));
        }
        Ok(Self::Tcp(addr.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::WebSocket(url) => f.write_str(url),
        }
    }
}
