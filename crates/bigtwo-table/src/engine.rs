//! The `GameEngine` trait: the rules collaborator.
//!
//! The client does not know how Big Two is scored or which hands beat
//! which. It hands the dealt deck and every move to an engine and reads
//! back whose turn it is.

use bigtwo_protocol::{Deck, Seat};

use crate::GameState;

/// Result of asking the engine to apply a move.
///
/// Rejection is a normal outcome, not an error: it is shown to the player
/// and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was legal and has been applied to the state.
    Accepted,
    /// The move was illegal; the state is unchanged.
    Rejected { reason: String },
}

impl MoveOutcome {
    /// Shorthand for a rejection.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`MoveOutcome::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// The rules engine.
///
/// Every method is called by the protocol state machine while it holds the
/// state lock, so implementations see a consistent state and must not try
/// to lock it themselves.
///
/// Engines keep whatever they need in [`GameState`] (hands, the table) or
/// behind their own interior mutability.
pub trait GameEngine: Send + Sync + 'static {
    /// Starts a round from `deck`.
    ///
    /// Called after the table has been cleared and every hand emptied.
    /// Typically deals the deck into the roster's hands.
    fn apply_start(&self, state: &mut GameState, deck: &Deck);

    /// Applies `cards` (indices into `seat`'s hand; empty = pass).
    ///
    /// On acceptance the engine appends the played hand to the table and
    /// updates the hands. On rejection it must leave `state` untouched.
    fn apply_move(&self, state: &mut GameState, seat: Seat, cards: &[usize]) -> MoveOutcome;

    /// The seat whose turn it is, if any.
    fn current_player(&self, state: &GameState) -> Option<Seat>;

    /// Returns `true` once the round has been won.
    fn is_game_over(&self, state: &GameState) -> bool;
}
