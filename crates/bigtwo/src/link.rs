//! The outbound half of a live session, shared by the caller's flow and
//! the receive loop.

use std::sync::Arc;

use bigtwo_protocol::{Codec, Envelope};
use bigtwo_session::Session;
use bigtwo_transport::{AnyConnection, Connection, TransportError};
use tokio_util::sync::CancellationToken;

use crate::{ClientError, Presenter};

/// One connection plus everything needed to send on it and to report its
/// loss exactly once.
pub(crate) struct Link<P, C, T = AnyConnection> {
    pub(crate) conn: T,
    pub(crate) codec: C,
    pub(crate) session: Arc<Session>,
    pub(crate) cancel: CancellationToken,
    presenter: Arc<P>,
    notice: String,
}

impl<P, C, T> Link<P, C, T>
where
    P: Presenter,
    C: Codec,
    T: Connection<Error = TransportError>,
{
    pub(crate) fn new(
        conn: T,
        codec: C,
        session: Arc<Session>,
        presenter: Arc<P>,
        notice: String,
    ) -> Self {
        Self {
            conn,
            codec,
            session,
            cancel: CancellationToken::new(),
            presenter,
            notice,
        }
    }

    /// Encodes and sends one envelope.
    ///
    /// Sends are refused once the session is lost. A failed write loses
    /// the session.
    pub(crate) async fn send(&self, envelope: &Envelope) -> Result<(), ClientError> {
        if !self.session.is_live() {
            return Err(ClientError::NotConnected);
        }
        let bytes = self.codec.encode(envelope)?;
        if let Err(e) = self.conn.send(&bytes).await {
            self.lose(&format!("send failed: {e}"));
            return Err(ClientError::Send(e));
        }
        tracing::debug!(
            conn_id = %self.conn.id(),
            kind = envelope.kind(),
            origin = ?envelope.origin,
            "sent envelope"
        );
        Ok(())
    }

    /// Marks the session lost and stops the receive loop. The first caller
    /// disables input and shows the disconnect notice; later calls do
    /// nothing visible.
    ///
    /// The token is cancelled last, so anyone woken by it sees the loss
    /// already reported.
    pub(crate) fn lose(&self, reason: &str) {
        if self.session.mark_lost(reason) {
            self.presenter.enable_input(false);
            self.presenter.show_message(&self.notice);
        }
        self.cancel.cancel();
    }
}
