//! `BigTwoClient` builder and facade.
//!
//! This is the entry point for front-ends. It ties together all the
//! layers: transport → protocol → session → table, and owns the receive
//! loop task of the current session.

use std::sync::Arc;
use std::time::Duration;

use bigtwo_protocol::{Codec, Envelope, JsonCodec, Message, Seat};
use bigtwo_session::{LocalIdentity, Session, SessionConfig};
use bigtwo_table::{GameEngine, GameState, GameStateView, SharedGameState};
use bigtwo_transport::{ConnectOptions, Connection, Endpoint};
use tokio::task::JoinHandle;

use crate::link::Link;
use crate::machine::{Phase, ProtocolMachine};
use crate::receiver::{SessionEnd, receive_loop};
use crate::{ClientError, Presenter};

/// The server address used when a front-end has no other.
pub const DEFAULT_SERVER: &str = "127.0.0.1:2396";

// ---------------------------------------------------------------------------
// ClientConfig / builder
// ---------------------------------------------------------------------------

/// Client-wide settings.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Per-session limits and the disconnect notice.
    pub session: SessionConfig,
}

/// Builder for configuring a [`BigTwoClient`].
///
/// # Example
///
/// ```rust,ignore
/// use bigtwo::prelude::*;
///
/// let mut client = BigTwoClient::builder()
///     .connect_timeout(Duration::from_secs(2))
///     .build(MyEngine::default(), Arc::new(MyPresenter));
/// client.connect(DEFAULT_SERVER, "Carol").await?;
/// ```
pub struct BigTwoClientBuilder {
    config: ClientConfig,
}

impl BigTwoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// How long `connect` waits for the server.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.session.connect_timeout = timeout;
        self
    }

    /// Largest TCP frame body accepted from the server.
    pub fn max_frame_length(mut self, len: usize) -> Self {
        self.config.session.max_frame_length = len;
        self
    }

    /// Text shown when the connection is lost.
    pub fn disconnect_notice(mut self, notice: &str) -> Self {
        self.config.session.disconnect_notice = notice.to_string();
        self
    }

    /// Replaces the whole session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Builds a client speaking JSON.
    pub fn build<E: GameEngine, P: Presenter>(
        self,
        engine: E,
        presenter: Arc<P>,
    ) -> BigTwoClient<E, P, JsonCodec> {
        self.build_with_codec(engine, presenter, JsonCodec)
    }

    /// Builds a client with a custom envelope codec.
    pub fn build_with_codec<E, P, C>(
        self,
        engine: E,
        presenter: Arc<P>,
        codec: C,
    ) -> BigTwoClient<E, P, C>
    where
        E: GameEngine,
        P: Presenter,
        C: Codec + Clone,
    {
        BigTwoClient {
            config: self.config,
            codec,
            engine: Arc::new(engine),
            presenter,
            state: SharedGameState::new(),
            live: None,
        }
    }
}

impl Default for BigTwoClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// BigTwoClient
// ---------------------------------------------------------------------------

/// The current (or most recent) session and its receive loop.
struct LiveSession<P, C> {
    link: Arc<Link<P, C>>,
    task: Option<JoinHandle<SessionEnd>>,
}

impl<P, C> Drop for LiveSession<P, C> {
    fn drop(&mut self) {
        self.link.cancel.cancel();
    }
}

/// A Big Two client: one game state, at most one live session.
///
/// Outbound actions are issued from the caller's flow; inbound envelopes
/// are handled by a receive loop task spawned on `connect`. Both share the
/// session, so a loss detected on either side is reported once.
pub struct BigTwoClient<E, P, C = JsonCodec> {
    config: ClientConfig,
    codec: C,
    engine: Arc<E>,
    presenter: Arc<P>,
    state: SharedGameState,
    live: Option<LiveSession<P, C>>,
}

impl BigTwoClient<(), (), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> BigTwoClientBuilder {
        BigTwoClientBuilder::new()
    }
}

impl<E, P, C> BigTwoClient<E, P, C>
where
    E: GameEngine,
    P: Presenter,
    C: Codec + Clone,
{
    /// Connects to `address` and starts the receive loop.
    ///
    /// `address` is `host:port` for TCP or a `ws://` URL. The name is sent
    /// once the server assigns a seat.
    ///
    /// # Errors
    /// - [`ClientError::AlreadyConnected`] if a session is still live.
    /// - [`ClientError::Session`] if `display_name` is blank.
    /// - [`ClientError::Connection`] if the address is malformed or the
    ///   server cannot be reached.
    pub async fn connect(&mut self, address: &str, display_name: &str) -> Result<(), ClientError> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        let identity = LocalIdentity::new(display_name)?;
        let endpoint: Endpoint = address.parse().map_err(ClientError::Connection)?;

        let options = ConnectOptions {
            timeout: self.config.session.connect_timeout,
            max_frame_length: self.config.session.max_frame_length,
        };
        let conn = bigtwo_transport::connect(&endpoint, &options)
            .await
            .map_err(ClientError::Connection)?;
        tracing::info!(conn_id = %conn.id(), %endpoint, player = identity.name(), "connected");

        self.state.write(|state| *state = GameState::new());
        let session = Arc::new(Session::new(identity));
        let link = Arc::new(Link::new(
            conn,
            self.codec.clone(),
            Arc::clone(&session),
            Arc::clone(&self.presenter),
            self.config.session.disconnect_notice.clone(),
        ));
        let machine = ProtocolMachine::new(
            session,
            self.state.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.presenter),
        );
        let task = tokio::spawn(receive_loop(Arc::clone(&link), machine));

        // A lost predecessor is dropped here, cancelling its loop.
        self.live = Some(LiveSession {
            link,
            task: Some(task),
        });
        Ok(())
    }

    /// Plays `card_indices` from the local player's hand. Empty means pass.
    ///
    /// # Errors
    /// - [`ClientError::NotConnected`] without a live, seated session.
    /// - [`ClientError::Send`] if the write fails; the session is lost.
    pub async fn make_move(&self, card_indices: &[usize]) -> Result<(), ClientError> {
        let link = self.live_link()?;
        let seat = link.session.identity().seat().ok_or(ClientError::NotConnected)?;
        let envelope = Envelope::from_seat(seat, Message::Move(card_indices.to_vec()));
        link.send(&envelope).await
    }

    /// Passes the turn.
    pub async fn pass(&self) -> Result<(), ClientError> {
        self.make_move(&[]).await
    }

    /// Sends a line of chat.
    ///
    /// # Errors
    /// Same as [`make_move`](Self::make_move), except that no seat is
    /// needed.
    pub async fn send_chat(&self, text: &str) -> Result<(), ClientError> {
        let link = self.live_link()?;
        let envelope = Envelope::unseated(Message::Msg(text.to_string()));
        link.send(&envelope).await
    }

    /// Ends the session: stops the receive loop, closes the connection, and
    /// waits for the loop to finish.
    ///
    /// The disconnect notice is shown unless the session was already lost.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] if there is no session to end.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        let mut live = self.live.take().ok_or(ClientError::NotConnected)?;
        live.link.lose("disconnected by client");
        if let Err(e) = live.link.conn.close().await {
            tracing::debug!(error = %e, "close after disconnect failed");
        }
        if let Some(task) = live.task.take() {
            match task.await {
                Ok(end) => tracing::debug!(reason = %end, "session ended"),
                Err(e) => tracing::warn!(error = %e, "receive loop panicked"),
            }
        }
        Ok(())
    }

    /// Waits until the server closes the connection or the session is
    /// otherwise lost, and returns why.
    ///
    /// # Errors
    /// [`ClientError::NotConnected`] if there is no session, or if its end
    /// was already collected.
    pub async fn wait_closed(&mut self) -> Result<SessionEnd, ClientError> {
        let task = self
            .live
            .as_mut()
            .and_then(|live| live.task.take())
            .ok_or(ClientError::NotConnected)?;
        match task.await {
            Ok(end) => Ok(end),
            Err(e) => {
                tracing::warn!(error = %e, "receive loop panicked");
                Ok(SessionEnd::Cancelled)
            }
        }
    }

    /// Resolves once the current session is lost, whatever the cause.
    ///
    /// The future holds no borrow of the client, so a front-end can
    /// `select!` on it next to its own input. It is ready at once when no
    /// session is live.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + use<E, P, C> {
        let token = self.live.as_ref().map(|live| live.link.cancel.clone());
        async move {
            if let Some(token) = token {
                token.cancelled_owned().await;
            }
        }
    }

    /// The local seat, once the server has assigned one.
    pub fn player_id(&self) -> Option<Seat> {
        self.live.as_ref().and_then(|live| live.link.session.identity().seat())
    }

    /// The local display name of the current or last session.
    pub fn player_name(&self) -> Option<&str> {
        self.live.as_ref().map(|live| live.link.session.identity().name())
    }

    /// Returns `true` while a session is live.
    pub fn is_connected(&self) -> bool {
        self.live.as_ref().is_some_and(|live| live.link.session.is_live())
    }

    /// A read-only view of the game state.
    pub fn state(&self) -> GameStateView {
        self.state.view()
    }

    /// The current lifecycle stage; `None` before the first `connect`.
    pub fn phase(&self) -> Option<Phase> {
        let live = self.live.as_ref()?;
        Some(self.state.read(|state| Phase::of(live.link.session.identity(), state)))
    }

    /// The active client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn live_link(&self) -> Result<&Link<P, C>, ClientError> {
        match &self.live {
            Some(live) if live.link.session.is_live() => Ok(&live.link),
            _ => Err(ClientError::NotConnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_session_config() {
        let builder = BigTwoClientBuilder::new()
            .connect_timeout(Duration::from_millis(250))
            .max_frame_length(4096)
            .disconnect_notice("Lost the table");
        let session = &builder.config.session;
        assert_eq!(session.connect_timeout, Duration::from_millis(250));
        assert_eq!(session.max_frame_length, 4096);
        assert_eq!(session.disconnect_notice, "Lost the table");
    }

    #[test]
    fn test_default_server_is_a_tcp_endpoint() {
        let endpoint: Endpoint = DEFAULT_SERVER.parse().unwrap();
        assert_eq!(endpoint, Endpoint::Tcp("127.0.0.1:2396".into()));
    }
}
