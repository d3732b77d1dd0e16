//! Shared game state for the Big Two client.
//!
//! - [`GameState`]: roster, cards played this round, and whose turn it is.
//! - [`SharedGameState`] / [`GameStateView`]: the same state behind one
//!   mutex; the writer handle belongs to the protocol state machine, the
//!   read-only view to presenters.
//! - [`GameEngine`]: the rules seam. The engine is only ever invoked with
//!   the state lock held, so its writes are part of the state machine's
//!   mutation.

mod engine;
mod error;
mod state;

pub use engine::{GameEngine, MoveOutcome};
pub use error::TableError;
pub use state::{GameState, GameStateView, Hand, Player, SharedGameState};
