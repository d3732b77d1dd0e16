//! Core protocol types for the Big Two wire format.
//!
//! Every value in this module travels "on the wire": the server and the
//! client exchange [`Envelope`]s, each carrying the seat it originated from
//! and one [`Message`] whose payload shape is fixed by its kind.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of seats at a Big Two table. Fixed by the game.
pub const NUM_PLAYERS: usize = 4;

/// Wire value of `origin` meaning "no specific seat".
///
/// The server uses it for broadcasts, the client for requests sent before
/// (or independently of) its seat assignment.
pub const NO_ORIGIN: i64 = -1;

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// A valid index into the roster.
///
/// A `Seat` can only be built for `0..NUM_PLAYERS`, so code holding one
/// never has to bounds-check the roster again. On the wire a seat is a
/// plain integer; "no seat" is [`NO_ORIGIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seat(u8);

impl Seat {
    /// Returns the seat for `index`, or `None` if it is off the table.
    pub fn new(index: usize) -> Option<Self> {
        if index < NUM_PLAYERS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Returns the roster index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the seat after this one, wrapping around the table.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % NUM_PLAYERS as u8)
    }

    /// Iterates all seats in roster order.
    pub fn all() -> impl Iterator<Item = Seat> {
        (0..NUM_PLAYERS as u8).map(Seat)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

const SUITS: [char; 4] = ['D', 'C', 'H', 'S'];
const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

/// A single playing card.
///
/// `suit` is 0–3 (diamonds, clubs, hearts, spades) and `rank` is 0–12
/// (ace through king). The client never interprets these beyond display;
/// ordering and legality belong to the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: u8,
    pub rank: u8,
}

impl Card {
    /// Creates a card from its raw suit and rank.
    pub fn new(suit: u8, rank: u8) -> Self {
        Self { suit, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = SUITS.get(self.suit as usize).copied().unwrap_or('?');
        let rank = RANKS.get(self.rank as usize).copied().unwrap_or("?");
        write!(f, "{suit}{rank}")
    }
}

/// The game-start descriptor carried by `START`: the dealt deck, in order.
///
/// `#[serde(transparent)]` puts the deck on the wire as a bare card list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Wraps an ordered list of cards.
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// The cards in deal order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if the deck holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Message: one variant per envelope kind
// ---------------------------------------------------------------------------

/// The body of an envelope.
///
/// `#[serde(tag = "kind", content = "payload")]` produces adjacently tagged
/// JSON, and `rename_all` gives the kinds their wire spelling:
///
/// ```text
/// { "kind": "JOIN", "payload": "Carol" }
/// { "kind": "MOVE", "payload": [0, 1] }
/// { "kind": "READY" }
/// ```
///
/// Because each variant owns a concrete payload type, a payload that does
/// not match its kind (a string under `MOVE`, three names under
/// `PLAYER_LIST`) fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Server → client, sent once on connect. `origin` is the seat assigned
    /// to the receiving client; the payload names every seat (empty string
    /// for a vacant one).
    PlayerList([String; NUM_PLAYERS]),

    /// Client → server: the local display name. Server → client: the player
    /// at `origin` has taken a seat.
    Join(String),

    /// Server → client: no seat is free.
    Full,

    /// Server → client: the player at `origin` left. The payload is
    /// informational only.
    Quit(String),

    /// Either direction: the sender (client) or the player at `origin`
    /// (server) is ready to start.
    Ready,

    /// Server → client: a new round begins with this deck.
    Start(Deck),

    /// Either direction: card indices into the mover's hand. Empty = pass.
    Move(Vec<usize>),

    /// Either direction: a line of chat.
    Msg(String),
}

impl Message {
    /// The wire name of this message's kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerList(_) => "PLAYER_LIST",
            Self::Join(_) => "JOIN",
            Self::Full => "FULL",
            Self::Quit(_) => "QUIT",
            Self::Ready => "READY",
            Self::Start(_) => "START",
            Self::Move(_) => "MOVE",
            Self::Msg(_) => "MSG",
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// One discrete protocol message.
///
/// ```text
/// { "origin": 2, "message": { "kind": "JOIN", "payload": "Carol" } }
/// ```
///
/// `origin` is `None` on the wire as `-1`. Any other integer outside the
/// roster fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The seat this envelope concerns, or `None` for "no specific seat".
    #[serde(with = "origin_index")]
    pub origin: Option<Seat>,

    /// Kind plus kind-typed payload.
    pub message: Message,
}

impl Envelope {
    /// An envelope with no origin seat (`-1` on the wire).
    pub fn unseated(message: Message) -> Self {
        Self {
            origin: None,
            message,
        }
    }

    /// An envelope originating from `seat`.
    pub fn from_seat(seat: Seat, message: Message) -> Self {
        Self {
            origin: Some(seat),
            message,
        }
    }

    /// Shorthand for `self.message.kind()`.
    pub fn kind(&self) -> &'static str {
        self.message.kind()
    }
}

/// Serde adapter mapping `Option<Seat>` to a signed seat index.
mod origin_index {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{NO_ORIGIN, NUM_PLAYERS, Seat};

    pub fn serialize<S: Serializer>(
        origin: &Option<Seat>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match origin {
            Some(seat) => serializer.serialize_i64(seat.index() as i64),
            None => serializer.serialize_i64(NO_ORIGIN),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Seat>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        if raw == NO_ORIGIN {
            return Ok(None);
        }
        let last = NUM_PLAYERS - 1;
        usize::try_from(raw)
            .ok()
            .and_then(Seat::new)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("origin {raw} outside [{NO_ORIGIN}, {last}]")))
    }
}

// =========================================================================
// Tests
// =========================================================================
