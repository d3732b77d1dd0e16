//! # Big Two client
//!
//! Networked client core for a four-player Big Two card game.
//!
//! The client connects to a game server, learns its seat, joins under a
//! display name, and then mirrors the table: every envelope from the
//! server is applied to one shared [`GameState`] by a protocol state
//! machine, and the local player's moves and chat go back the other way.
//!
//! Front-ends supply two collaborators:
//!
//! - a [`GameEngine`] that knows the rules (dealing, legal moves, turns)
//! - a [`Presenter`] that shows messages and redraws from a
//!   [`GameStateView`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bigtwo::prelude::*;
//!
//! // Implement GameEngine and Presenter, then:
//! // let mut client = BigTwoClient::builder()
//! //     .build(MyEngine::default(), Arc::new(MyPresenter));
//! // client.connect(DEFAULT_SERVER, "Carol").await?;
//! // client.make_move(&[0, 1]).await?;
//! ```

mod client;
mod error;
mod link;
mod machine;
mod presenter;
mod receiver;

pub use client::{BigTwoClient, BigTwoClientBuilder, ClientConfig, DEFAULT_SERVER};
pub use error::ClientError;
pub use machine::{Phase, ProtocolMachine};
pub use presenter::Presenter;
pub use receiver::SessionEnd;

pub use bigtwo_protocol::{
    Card, Codec, Deck, Envelope, JsonCodec, Message, NUM_PLAYERS, ProtocolError, Seat,
};
pub use bigtwo_session::{LocalIdentity, Session, SessionConfig, SessionError};
pub use bigtwo_table::{
    GameEngine, GameState, GameStateView, Hand, MoveOutcome, Player, SharedGameState, TableError,
};
pub use bigtwo_transport::{Endpoint, TransportError};

/// Everything a front-end needs, in one import.
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::{
        BigTwoClient, BigTwoClientBuilder, Card, ClientConfig, ClientError, DEFAULT_SERVER, Deck,
        Envelope, GameEngine, GameState, GameStateView, Hand, Message, MoveOutcome, NUM_PLAYERS,
        Phase, Player, Presenter, Seat, SessionConfig, SessionEnd,
    };
}
