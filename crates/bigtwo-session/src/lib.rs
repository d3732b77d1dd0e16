//! Session state for the Big Two client.
//!
//! A session spans one connection, from `connect` until the link is lost:
//!
//! 1. **Identity**: who the local player is ([`LocalIdentity`]), meaning the
//!    display name chosen before connecting, and the seat the server
//!    assigns exactly once.
//! 2. **Liveness**: whether the link is still usable ([`Session`],
//!    [`SessionState`]). Loss is latched so it is reported exactly once.
//!
//! ```text
//! State machine / facade (above)  ← reads identity, reports loss
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides Seat
//! ```

mod error;
mod identity;
mod session;

pub use error::SessionError;
pub use identity::LocalIdentity;
pub use session::{Session, SessionConfig, SessionState};
