//! The local player's identity.

use std::sync::OnceLock;

use bigtwo_protocol::Seat;

use crate::SessionError;

/// Who the local player is, for the lifetime of one session.
///
/// The name is fixed at construction. The seat starts unassigned and is
/// written at most once, by the first `PLAYER_LIST` the server sends.
/// `OnceLock` makes the write-once rule hold even though the receive loop
/// writes it while the caller's flow reads it.
#[derive(Debug)]
pub struct LocalIdentity {
    name: String,
    seat: OnceLock<Seat>,
}

impl LocalIdentity {
    /// Creates an identity for `name`, trimmed.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidName`] if the trimmed name is empty.
    pub fn new(name: &str) -> Result<Self, SessionError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidName(name.to_string()));
        }
        Ok(Self {
            name: trimmed.to_string(),
            seat: OnceLock::new(),
        })
    }

    /// The display name sent in `JOIN`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The assigned seat, or `None` before the first `PLAYER_LIST`.
    pub fn seat(&self) -> Option<Seat> {
        self.seat.get().copied()
    }

    /// Records the seat the server assigned.
    ///
    /// Assigning the same seat again is a no-op.
    ///
    /// # Errors
    /// Returns [`SessionError::SeatAlreadyAssigned`] if a different seat
    /// was already recorded; the original assignment is kept.
    pub fn assign_seat(&self, seat: Seat) -> Result<(), SessionError> {
        let current = *self.seat.get_or_init(|| seat);
        if current != seat {
            return Err(SessionError::SeatAlreadyAssigned {
                current,
                attempted: seat,
            });
        }
        Ok(())
    }

    /// Returns `true` if `seat` is the local player's seat.
    pub fn is_me(&self, seat: Seat) -> bool {
        self.seat() == Some(seat)
    }
}
