//! The receive loop: the only task that reads from the connection.
//!
//! ```text
//!   recv ─→ decode ─→ machine.apply ─→ send replies ─→ recv …
//!     │        │
//!     │        └─ malformed: warn, skip
//!     └─ closed / error / cancelled: report loss once, exit
//! ```

use std::fmt;
use std::sync::Arc;

use bigtwo_protocol::{Codec, Envelope};
use bigtwo_table::GameEngine;
use bigtwo_transport::Connection;

use crate::link::Link;
use crate::machine::ProtocolMachine;
use crate::{ClientError, Presenter};

/// Why a session's receive loop stopped.
#[derive(Debug)]
pub enum SessionEnd {
    /// The server closed the connection.
    Closed,
    /// The client disconnected, or a send failure stopped the loop.
    Cancelled,
    /// Reading or replying failed.
    Failed(ClientError),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed by server"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// Runs until the connection closes, fails, or `link.cancel` fires.
///
/// Envelopes are applied strictly in arrival order, and each one's replies
/// are sent before the next frame is read.
pub(crate) async fn receive_loop<E, P, C>(
    link: Arc<Link<P, C>>,
    machine: ProtocolMachine<E, P>,
) -> SessionEnd
where
    E: GameEngine,
    P: Presenter,
    C: Codec,
{
    let conn_id = link.conn.id();
    tracing::info!(%conn_id, "receive loop started");

    let end = 'frames: loop {
        let frame = tokio::select! {
            biased;
            () = link.cancel.cancelled() => break 'frames SessionEnd::Cancelled,
            frame = link.conn.recv() => frame,
        };

        let data = match frame {
            Ok(Some(data)) => data,
            Ok(None) => break SessionEnd::Closed,
            Err(e) => break SessionEnd::Failed(ClientError::from_recv(e)),
        };

        let envelope: Envelope = match link.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "dropping undecodable envelope");
                continue;
            }
        };

        for reply in machine.apply(envelope) {
            match link.send(&reply).await {
                Ok(()) => {}
                Err(ClientError::Protocol(e)) => {
                    tracing::warn!(%conn_id, error = %e, "could not encode reply");
                }
                Err(ClientError::NotConnected) => break 'frames SessionEnd::Cancelled,
                Err(e) => break 'frames SessionEnd::Failed(e),
            }
        }
    };

    tracing::info!(%conn_id, reason = %end, "receive loop stopped");
    link.lose(&end.to_string());
    end
}
