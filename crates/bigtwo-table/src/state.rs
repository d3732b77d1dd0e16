//! Roster, table, and turn pointer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bigtwo_protocol::{Card, NUM_PLAYERS, Seat};

use crate::TableError;

// ---------------------------------------------------------------------------
// Player / Hand
// ---------------------------------------------------------------------------

/// One seat of the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Player {
    /// Display name. Empty means the seat is vacant.
    pub name: String,
    /// Cards currently held.
    pub hand: Vec<Card>,
}

impl Player {
    /// Returns `true` if nobody sits here.
    pub fn is_vacant(&self) -> bool {
        self.name.is_empty()
    }
}

/// A hand played onto the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    /// Who played it.
    pub seat: Seat,
    /// The cards played. Empty for a pass.
    pub cards: Vec<Card>,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Everything the client knows about the table.
///
/// Invariant: `active_player` is `None` or an occupied seat.
/// [`set_active_player`](Self::set_active_player) refuses vacant seats and
/// [`vacate`](Self::vacate) drops the turn if the active player leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    roster: [Player; NUM_PLAYERS],
    table: Vec<Hand>,
    active_player: Option<Seat>,
}

impl GameState {
    /// An empty roster, empty table, nobody's turn.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Roster --

    /// All seats in order.
    pub fn roster(&self) -> &[Player; NUM_PLAYERS] {
        &self.roster
    }

    /// The player at `seat`.
    pub fn player(&self, seat: Seat) -> &Player {
        &self.roster[seat.index()]
    }

    /// Mutable access to the player at `seat`, for dealing and playing
    /// cards.
    pub fn player_mut(&mut self, seat: Seat) -> &mut Player {
        &mut self.roster[seat.index()]
    }

    /// Display name at `seat` (empty if vacant).
    pub fn name(&self, seat: Seat) -> &str {
        &self.player(seat).name
    }

    /// Seats with a player in them.
    pub fn occupied_seats(&self) -> impl Iterator<Item = Seat> + '_ {
        Seat::all().filter(|seat| !self.player(*seat).is_vacant())
    }

    /// Overwrites every display name, keeping hands.
    pub fn set_names(&mut self, names: [String; NUM_PLAYERS]) {
        for (player, name) in self.roster.iter_mut().zip(names) {
            player.name = name;
        }
        if let Some(active) = self.active_player {
            if self.player(active).is_vacant() {
                self.active_player = None;
            }
        }
    }

    /// Seats `name` at `seat`.
    pub fn set_name(&mut self, seat: Seat, name: String) {
        let emptied = name.is_empty();
        self.player_mut(seat).name = name;
        if emptied && self.active_player == Some(seat) {
            self.active_player = None;
        }
    }

    /// Marks `seat` vacant.
    ///
    /// Returns `true` if the seat held the turn, which is dropped.
    pub fn vacate(&mut self, seat: Seat) -> bool {
        self.player_mut(seat).name.clear();
        if self.active_player == Some(seat) {
            self.active_player = None;
            true
        } else {
            false
        }
    }

    // -- Table --

    /// Hands played this round, oldest first.
    pub fn table(&self) -> &[Hand] {
        &self.table
    }

    /// The most recent hand on the table.
    pub fn last_hand(&self) -> Option<&Hand> {
        self.table.last()
    }

    /// Appends a played hand.
    pub fn push_hand(&mut self, hand: Hand) {
        self.table.push(hand);
    }

    /// Clears the table and every hand and drops the turn, ready for a new
    /// deal. Names are kept.
    pub fn reset_round(&mut self) {
        self.table.clear();
        for player in &mut self.roster {
            player.hand.clear();
        }
        self.active_player = None;
    }

    // -- Turn --

    /// Whose turn it is.
    pub fn active_player(&self) -> Option<Seat> {
        self.active_player
    }

    /// Hands the turn to `seat`, or to nobody.
    ///
    /// # Errors
    /// Returns [`TableError::VacantSeat`] for an unoccupied seat; the turn
    /// is left unchanged.
    pub fn set_active_player(&mut self, seat: Option<Seat>) -> Result<(), TableError> {
        if let Some(seat) = seat {
            if self.player(seat).is_vacant() {
                return Err(TableError::VacantSeat(seat));
            }
        }
        self.active_player = seat;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SharedGameState / GameStateView
// ---------------------------------------------------------------------------

/// The game state behind its single lock, with write access.
///
/// Held by the protocol state machine. Everyone else gets a
/// [`GameStateView`].
#[derive(Debug, Clone, Default)]
pub struct SharedGameState {
    inner: Arc<Mutex<GameState>>,
}

impl SharedGameState {
    /// A fresh, empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with exclusive access. The whole closure is one atomic
    /// step as seen by readers.
    pub fn write<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Runs `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&lock(&self.inner))
    }

    /// A read-only handle onto the same state.
    pub fn view(&self) -> GameStateView {
        GameStateView {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only handle to the game state, for presenters.
#[derive(Debug, Clone)]
pub struct GameStateView {
    inner: Arc<Mutex<GameState>>,
}

impl GameStateView {
    /// Runs `f` against the current state. Never observes a half-applied
    /// envelope.
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&lock(&self.inner))
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> GameState {
        self.read(GameState::clone)
    }

    /// Whose turn it is.
    pub fn active_player(&self) -> Option<Seat> {
        self.read(GameState::active_player)
    }

    /// Display names of all seats.
    pub fn names(&self) -> [String; NUM_PLAYERS] {
        self.read(|state| state.roster().clone().map(|player| player.name))
    }
}

fn lock(inner: &Mutex<GameState>) -> MutexGuard<'_, GameState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
