//! The `Presenter` trait: where the client's notifications go.

/// Receives UI notifications from the client.
///
/// Called from the receive loop task after each envelope has been applied
/// and the state lock released, so implementations may read the state
/// through a [`GameStateView`](bigtwo_table::GameStateView). Methods must
/// return quickly: the next envelope waits until they do.
pub trait Presenter: Send + Sync + 'static {
    /// The roster, table, or turn changed; redraw from the state.
    fn refresh(&self);

    /// A status line for the player.
    fn show_message(&self, text: &str);

    /// A line of chat from the server.
    fn show_chat_line(&self, text: &str);

    /// Allows or forbids the player to act.
    fn enable_input(&self, enabled: bool);
}
