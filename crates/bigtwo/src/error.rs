//! Unified error type for the Big Two client.

use bigtwo_protocol::ProtocolError;
use bigtwo_session::SessionError;
use bigtwo_transport::TransportError;

/// Top-level error returned by [`BigTwoClient`](crate::BigTwoClient).
///
/// Transport failures are split by where they happened, since the caller
/// reacts differently to a refused connection and a broken one. Protocol
/// and session errors convert with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached, or the address was malformed.
    #[error("connection failed: {0}")]
    Connection(#[source] TransportError),

    /// Writing a frame failed. The session is lost.
    #[error("send failed: {0}")]
    Send(#[source] TransportError),

    /// Reading a frame failed. The session is lost.
    #[error("receive failed: {0}")]
    Receive(#[source] TransportError),

    /// Frame boundaries can no longer be trusted. The session is lost.
    #[error("protocol desync: {0}")]
    Desync(#[source] TransportError),

    /// An envelope could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The display name or seat assignment was refused.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No live session, or the server has not assigned a seat yet.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called while a session is still live.
    #[error("already connected")]
    AlreadyConnected,
}

impl ClientError {
    /// Sorts a receive-side transport failure into [`Desync`](Self::Desync)
    /// or [`Receive`](Self::Receive).
    pub(crate) fn from_recv(err: TransportError) -> Self {
        if err.is_desync() {
            Self::Desync(err)
        } else {
            Self::Receive(err)
        }
    }
}
