//! The protocol state machine: one envelope in, state mutated, replies out.
//!
//! ```text
//!   AwaitingIdentity ──PLAYER_LIST──→ Lobby ──START──→ Playing
//!                                                  ↑        │ game over
//!                                                  └─START──┴──→ RoundOver
//! ```
//!
//! Each [`ProtocolMachine::apply`] is one transaction: the state lock is
//! taken, the roster/table/turn are updated (the engine runs inside the
//! lock), the lock is released, and only then is the presenter notified.
//! Replies are returned to the caller, which sends them after the mutation.

use std::fmt;
use std::sync::Arc;

use bigtwo_protocol::{Deck, Envelope, Message, NUM_PLAYERS, Seat};
use bigtwo_session::{LocalIdentity, Session};
use bigtwo_table::{GameEngine, GameState, MoveOutcome, SharedGameState};

use crate::Presenter;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle stage implied by the identity and the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connected, waiting for the server to assign a seat.
    AwaitingIdentity,
    /// Seated, no round dealt yet.
    Lobby,
    /// A round is in progress and someone holds the turn.
    Playing,
    /// Cards have been played but nobody holds the turn.
    RoundOver,
}

impl Phase {
    /// Derives the phase from `identity` and `state`.
    pub fn of(identity: &LocalIdentity, state: &GameState) -> Self {
        if identity.seat().is_none() {
            Self::AwaitingIdentity
        } else if state.active_player().is_some() {
            Self::Playing
        } else if !state.table().is_empty() {
            Self::RoundOver
        } else {
            Self::Lobby
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingIdentity => write!(f, "AwaitingIdentity"),
            Self::Lobby => write!(f, "Lobby"),
            Self::Playing => write!(f, "Playing"),
            Self::RoundOver => write!(f, "RoundOver"),
        }
    }
}

// ---------------------------------------------------------------------------
// Turn bookkeeping
// ---------------------------------------------------------------------------

/// What a START or accepted MOVE left behind, captured under the lock.
struct TurnChange {
    active: Option<Seat>,
    active_name: String,
    game_over: bool,
}

/// Result of a MOVE, captured under the lock.
enum MoveResult {
    Applied(TurnChange),
    OutOfTurn { mover: String },
    Rejected { mover: String, reason: String },
}

/// Display label for `seat`: its name, or the seat itself if vacant.
fn label(state: &GameState, seat: Seat) -> String {
    let name = state.name(seat);
    if name.is_empty() {
        seat.to_string()
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// ProtocolMachine
// ---------------------------------------------------------------------------

/// Applies inbound envelopes to the shared game state.
///
/// Owned by the receive loop. Front-ends normally never touch it; it is
/// public so a machine can be driven without a socket.
pub struct ProtocolMachine<E, P> {
    session: Arc<Session>,
    state: SharedGameState,
    engine: Arc<E>,
    presenter: Arc<P>,
}

impl<E, P> ProtocolMachine<E, P>
where
    E: GameEngine,
    P: Presenter,
{
    /// Creates a machine for `session` writing into `state`.
    pub fn new(
        session: Arc<Session>,
        state: SharedGameState,
        engine: Arc<E>,
        presenter: Arc<P>,
    ) -> Self {
        Self {
            session,
            state,
            engine,
            presenter,
        }
    }

    /// The current lifecycle stage.
    pub fn phase(&self) -> Phase {
        self.state.read(|state| Phase::of(self.identity(), state))
    }

    fn identity(&self) -> &LocalIdentity {
        self.session.identity()
    }

    /// Applies one envelope and returns the envelopes to send in reply.
    ///
    /// Never fails: malformed or out-of-place envelopes are logged and
    /// dropped without touching the state.
    pub fn apply(&self, envelope: Envelope) -> Vec<Envelope> {
        let Envelope { origin, message } = envelope;
        tracing::debug!(kind = message.kind(), ?origin, "applying envelope");

        match message {
            Message::PlayerList(names) => self.on_player_list(origin, names),
            Message::Join(name) => self.on_join(origin, name),
            Message::Full => {
                self.presenter.show_message("Server is full, cannot join the game");
                Vec::new()
            }
            Message::Quit(_) => self.on_quit(origin),
            Message::Ready => self.on_ready(origin),
            Message::Start(deck) => self.on_start(&deck),
            Message::Move(cards) => self.on_move(origin, &cards),
            Message::Msg(text) => {
                self.presenter.show_chat_line(&text);
                Vec::new()
            }
        }
    }

    // -- Roster --

    fn on_player_list(&self, origin: Option<Seat>, names: [String; NUM_PLAYERS]) -> Vec<Envelope> {
        let Some(seat) = require_origin(origin, "PLAYER_LIST") else {
            return Vec::new();
        };

        let name = self.identity().name();
        let first = self.identity().seat().is_none();
        match self.identity().assign_seat(seat) {
            Ok(()) if first => tracing::info!(%seat, player = name, "seat assigned"),
            Ok(()) => {}
            Err(e) => tracing::warn!(error = %e, "server tried to move us; keeping seat"),
        }
        self.state.write(|state| state.set_names(names));
        self.presenter.refresh();

        vec![Envelope::unseated(Message::Join(name.to_string()))]
    }

    fn on_join(&self, origin: Option<Seat>, name: String) -> Vec<Envelope> {
        let Some(seat) = require_origin(origin, "JOIN") else {
            return Vec::new();
        };

        self.state.write(|state| state.set_name(seat, name.clone()));

        let replies = if self.identity().is_me(seat) {
            vec![Envelope::unseated(Message::Ready)]
        } else {
            self.presenter.show_message(&format!("{name} joined the game"));
            Vec::new()
        };
        self.presenter.refresh();
        replies
    }

    fn on_quit(&self, origin: Option<Seat>) -> Vec<Envelope> {
        let Some(seat) = require_origin(origin, "QUIT") else {
            return Vec::new();
        };

        let (name, lost_turn) =
            self.state.write(|state| (label(state, seat), state.vacate(seat)));

        self.presenter.show_message(&format!("{name} left the game"));
        if lost_turn {
            tracing::info!(%seat, "active player left; round halted");
            self.presenter.enable_input(false);
        }
        self.presenter.refresh();
        vec![Envelope::unseated(Message::Ready)]
    }

    fn on_ready(&self, origin: Option<Seat>) -> Vec<Envelope> {
        let Some(seat) = require_origin(origin, "READY") else {
            return Vec::new();
        };

        let name = self.state.read(|state| label(state, seat));
        self.presenter.show_message(&format!("{name} is READY"));
        Vec::new()
    }

    // -- Round --

    fn on_start(&self, deck: &Deck) -> Vec<Envelope> {
        let turn = self.state.write(|state| {
            state.reset_round();
            self.engine.apply_start(state, deck);
            self.settle_turn(state)
        });
        tracing::info!(cards = deck.len(), active = ?turn.active, "round started");
        self.announce(&turn);
        Vec::new()
    }

    fn on_move(&self, origin: Option<Seat>, cards: &[usize]) -> Vec<Envelope> {
        let Some(seat) = require_origin(origin, "MOVE") else {
            return Vec::new();
        };

        let result = self.state.write(|state| {
            let mover = label(state, seat);
            if state.active_player() != Some(seat) {
                return MoveResult::OutOfTurn { mover };
            }
            match self.engine.apply_move(state, seat, cards) {
                MoveOutcome::Accepted => MoveResult::Applied(self.settle_turn(state)),
                MoveOutcome::Rejected { reason } => MoveResult::Rejected { mover, reason },
            }
        });

        match result {
            MoveResult::Applied(turn) => self.announce(&turn),
            MoveResult::OutOfTurn { mover } => {
                tracing::warn!(%seat, "MOVE out of turn, ignored");
                self.presenter.show_message(&format!("{mover} moved out of turn"));
                self.presenter.refresh();
            }
            MoveResult::Rejected { mover, reason } => {
                tracing::debug!(%seat, reason, "move rejected by engine");
                self.presenter.show_message(&format!("{mover}: not a legal move ({reason})"));
                self.presenter.refresh();
            }
        }
        Vec::new()
    }

    /// Reads the next turn back from the engine. Runs under the lock.
    fn settle_turn(&self, state: &mut GameState) -> TurnChange {
        let game_over = self.engine.is_game_over(state);
        let next = if game_over { None } else { self.engine.current_player(state) };

        let active = match state.set_active_player(next) {
            Ok(()) => next,
            Err(e) => {
                tracing::warn!(error = %e, "engine chose an empty seat");
                let _ = state.set_active_player(None);
                None
            }
        };
        TurnChange {
            active,
            active_name: active.map(|s| label(state, s)).unwrap_or_default(),
            game_over,
        }
    }

    fn announce(&self, turn: &TurnChange) {
        if turn.game_over {
            self.presenter.show_message("Game ends");
        } else if turn.active.is_some() {
            self.presenter.show_message(&format!("{}'s turn", turn.active_name));
        }
        self.presenter.refresh();
        let mine = turn.active.is_some_and(|seat| self.identity().is_me(seat));
        self.presenter.enable_input(mine);
    }
}

fn require_origin(origin: Option<Seat>, kind: &str) -> Option<Seat> {
    if origin.is_none() {
        tracing::warn!(kind, "envelope without origin seat, dropped");
    }
    origin
}
