//! Session types: the client's record of one live connection.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::LocalIdentity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Front-ends override individual fields starting from
/// `SessionConfig::default()`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the server has to accept the connection.
    ///
    /// Default: 5 seconds.
    pub connect_timeout: Duration,

    /// Largest frame body accepted from the server, in bytes. A larger
    /// length prefix means the stream is desynchronized.
    ///
    /// Default: 1 MiB.
    pub max_frame_length: usize,

    /// Text shown to the player when the link is lost.
    pub disconnect_notice: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_frame_length: 1024 * 1024,
            disconnect_notice: "Disconnected from server".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Liveness of a session.
///
/// ```text
///   Connected ──(close / error / cancel)──→ Lost
/// ```
///
/// There is no way back: a lost session needs a fresh `connect`, which
/// creates a new [`Session`].
#[derive(Debug, Clone)]
pub enum SessionState {
    /// The link is up.
    Connected,

    /// The link went down at `since`.
    Lost { since: Instant, reason: String },
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connection's identity and liveness.
///
/// Shared (behind an `Arc`) between the receive loop and the caller's
/// flow. Either side may detect loss first; [`mark_lost`](Self::mark_lost)
/// lets exactly one of them report it.
#[derive(Debug)]
pub struct Session {
    identity: LocalIdentity,
    state: Mutex<SessionState>,
}

impl Session {
    /// Starts a connected session for `identity`.
    pub fn new(identity: LocalIdentity) -> Self {
        Self {
            identity,
            state: Mutex::new(SessionState::Connected),
        }
    }

    /// The local player's identity.
    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// A snapshot of the current liveness.
    pub fn state(&self) -> SessionState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns `true` while the link is up.
    pub fn is_live(&self) -> bool {
        matches!(self.state(), SessionState::Connected)
    }

    /// Moves the session to `Lost`.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// the caller that gets `true` owns the disconnect notice.
    pub fn mark_lost(&self, reason: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            SessionState::Connected => {
                *state = SessionState::Lost {
                    since: Instant::now(),
                    reason: reason.to_string(),
                };
                tracing::info!(player = self.identity.name(), reason, "session lost");
                true
            }
            SessionState::Lost { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn session() -> Session {
        Session::new(LocalIdentity::new("Carol").unwrap())
    }

    #[test]
    fn test_new_session_is_live() {
        let s = session();
        assert!(s.is_live());
        assert!(matches!(s.state(), SessionState::Connected));
        assert_eq!(s.identity().name(), "Carol");
    }

    #[test]
    fn test_mark_lost_reports_once() {
        let s = session();
        assert!(s.mark_lost("closed"));
        assert!(!s.mark_lost("closed again"));
        assert!(!s.is_live());

        match s.state() {
            SessionState::Lost { reason, .. } => assert_eq!(reason, "closed"),
            other => panic!("expected Lost, got {other:?}"),
        }
    }

    #[test]
    fn test_mark_lost_races_have_one_winner() {
        let s = Arc::new(session());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || s.mark_lost("race"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_frame_length, 1024 * 1024);
        assert_eq!(config.disconnect_notice, "Disconnected from server");
    }
}
