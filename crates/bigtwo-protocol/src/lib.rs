//! Wire protocol for the Big Two client.
//!
//! - **Types** ([`Envelope`], [`Message`], [`Seat`], [`Deck`]): what
//!   travels between client and server.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how an envelope becomes the
//!   body of one frame.
//! - **Errors** ([`ProtocolError`]): per-envelope encode/decode failures.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → State machine (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Card, Deck, Envelope, Message, NO_ORIGIN, NUM_PLAYERS, Seat};
