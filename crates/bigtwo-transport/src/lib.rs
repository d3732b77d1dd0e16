//! Transport layer for the Big Two client.
//!
//! Provides the [`Connection`] trait over a bidirectional stream of frames,
//! with two implementations:
//!
//! - [`TcpConnection`]: raw TCP, 4-byte big-endian length prefix per frame
//! - [`WebSocketConnection`]: one binary WebSocket message per frame
//!
//! [`connect`] picks the implementation from an [`Endpoint`].
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod endpoint;
mod error;
mod tcp;
#[cfg(feature = "websocket")]
mod websocket;

pub use endpoint::Endpoint;
pub use error::TransportError;
pub use tcp::{TcpConnection, frame_codec};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketConnection;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }

    pub(crate) fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Limits applied while establishing and using a connection.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// How long the remote has to accept the connection.
    pub timeout: Duration,

    /// Largest frame body accepted on a TCP stream. A length prefix above
    /// this is treated as a desynchronized stream.
    pub max_frame_length: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_frame_length: 1024 * 1024,
        }
    }
}

/// A single connection that can send and receive frames.
///
/// `send` and `recv` lock separate halves of the stream, so a task parked
/// in `recv` never delays a `send` from another task. Concurrent `send`
/// calls are serialized: one frame is fully written before the next starts.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the sending side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// A connection of whichever kind the endpoint asked for.
pub enum AnyConnection {
    Tcp(TcpConnection),
    #[cfg(feature = "websocket")]
    WebSocket(WebSocketConnection),
}

impl Connection for AnyConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            Self::Tcp(conn) => conn.send(data).await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(conn) => conn.send(data).await,
        }
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            Self::Tcp(conn) => conn.recv().await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(conn) => conn.recv().await,
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self {
            Self::Tcp(conn) => conn.close().await,
            #[cfg(feature = "websocket")]
            Self::WebSocket(conn) => conn.close().await,
        }
    }

    fn id(&self) -> ConnectionId {
        match self {
            Self::Tcp(conn) => conn.id(),
            #[cfg(feature = "websocket")]
            Self::WebSocket(conn) => conn.id(),
        }
    }
}

/// Opens a connection to `endpoint`.
///
/// # Errors
/// - [`TransportError::ConnectFailed`]: unreachable or refused
/// - [`TransportError::ConnectTimeout`]: no answer within `options.timeout`
/// - [`TransportError::InvalidAddress`]: WebSocket endpoint without the
///   `websocket` feature
pub async fn connect(
    endpoint: &Endpoint,
    options: &ConnectOptions,
) -> Result<AnyConnection, TransportError> {
    match endpoint {
        Endpoint::Tcp(addr) => TcpConnection::connect(addr, options).await.map(AnyConnection::Tcp),
        #[cfg(feature = "websocket")]
        Endpoint::WebSocket(url) => WebSocketConnection::connect(url, options)
            .await
            .map(AnyConnection::WebSocket),
        #[cfg(not(feature = "websocket"))]
        Endpoint::WebSocket(url) => Err(TransportError::InvalidAddress(
            format!("{url}: built without websocket support"),
        )),
    }
}
