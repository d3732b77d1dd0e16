//! Error types for the session layer.

use bigtwo_protocol::Seat;

/// Errors that can occur while setting up or updating a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The display name is unusable. An empty name means "vacant seat" on
    /// the wire, so it can never identify a player.
    #[error("invalid display name: {0:?}")]
    InvalidName(String),

    /// The server tried to move us to another seat after one was assigned.
    /// The seat is fixed for the lifetime of the session.
    #[error("seat already assigned ({current}), refusing {attempted}")]
    SeatAlreadyAssigned { current: Seat, attempted: Seat },
}
