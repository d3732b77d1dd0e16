//! Error types for the table layer.

use bigtwo_protocol::Seat;

/// Errors that can occur when updating the game state.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Only an occupied seat can hold the turn.
    #[error("{0} is vacant and cannot be the active player")]
    VacantSeat(Seat),
}
