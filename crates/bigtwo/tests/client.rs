//! Integration tests for the client against a fake length-prefixed TCP
//! server.

use std::sync::Mutex;
use std::time::Duration;

use bigtwo::prelude::*;
use bigtwo_transport::frame_codec;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

// =========================================================================
// Test doubles
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Refresh,
    Message(String),
    Chat(String),
    Input(bool),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for Recorder {
    fn refresh(&self) {
        self.push(Event::Refresh);
    }
    fn show_message(&self, text: &str) {
        self.push(Event::Message(text.to_string()));
    }
    fn show_chat_line(&self, text: &str) {
        self.push(Event::Chat(text.to_string()));
    }
    fn enable_input(&self, enabled: bool) {
        self.push(Event::Input(enabled));
    }
}

/// Accepts every move and never hands out the turn.
struct NoRules;

impl GameEngine for NoRules {
    fn apply_start(&self, _state: &mut GameState, _deck: &Deck) {}

    fn apply_move(&self, _state: &mut GameState, _seat: Seat, _cards: &[usize]) -> MoveOutcome {
        MoveOutcome::Accepted
    }

    fn current_player(&self, _state: &GameState) -> Option<Seat> {
        None
    }

    fn is_game_over(&self, _state: &GameState) -> bool {
        false
    }
}

type Server = Framed<TcpStream, LengthDelimitedCodec>;

const NOTICE: &str = "Disconnected from server";

// =========================================================================
// Helpers
// =========================================================================

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

async fn accept(listener: &TcpListener) -> Server {
    let (stream, _) = listener.accept().await.unwrap();
    Framed::new(stream, frame_codec(1024 * 1024))
}

fn client(presenter: &Arc<Recorder>) -> BigTwoClient<NoRules, Recorder> {
    BigTwoClient::builder()
        .connect_timeout(Duration::from_secs(2))
        .build(NoRules, Arc::clone(presenter))
}

async fn send(server: &mut Server, value: Value) {
    let bytes = serde_json::to_vec(&value).unwrap();
    server.send(Bytes::from(bytes)).await.unwrap();
}

async fn recv(server: &mut Server) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), server.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("client closed the connection")
        .unwrap();
    serde_json::from_slice(&frame).unwrap()
}

fn player_list(me: i64) -> Value {
    json!({
        "origin": me,
        "message": {
            "kind": "PLAYER_LIST",
            "payload": ["Alice", "Bob", "", ""]
        }
    })
}

/// Connects "Carol", hands her seat 2, and consumes her JOIN.
async fn seated(presenter: &Arc<Recorder>) -> (BigTwoClient<NoRules, Recorder>, Server) {
    let (listener, addr) = listen().await;
    let mut client = client(presenter);
    client.connect(&addr, "Carol").await.unwrap();
    let mut server = accept(&listener).await;

    send(&mut server, player_list(2)).await;
    let join = recv(&mut server).await;
    assert_eq!(join["message"]["kind"], "JOIN");
    (client, server)
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_player_list_is_answered_with_join() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = client(&presenter);
    client.connect(&addr, "Carol").await.unwrap();
    let mut server = accept(&listener).await;

    assert_eq!(client.player_id(), None);
    assert_eq!(client.phase(), Some(Phase::AwaitingIdentity));

    send(&mut server, player_list(2)).await;

    assert_eq!(
        recv(&mut server).await,
        json!({
            "origin": -1,
            "message": { "kind": "JOIN", "payload": "Carol" }
        })
    );
    assert_eq!(client.player_id(), Seat::new(2));
    assert_eq!(client.player_name(), Some("Carol"));
    assert_eq!(client.state().names()[0], "Alice");
}

#[tokio::test]
async fn test_own_join_is_answered_with_ready() {
    let presenter = Arc::new(Recorder::default());
    let (_client, mut server) = seated(&presenter).await;

    let join = json!({ "origin": 2, "message": { "kind": "JOIN", "payload": "Carol" } });
    send(&mut server, join).await;

    assert_eq!(recv(&mut server).await, json!({ "origin": -1, "message": { "kind": "READY" } }));
}

#[tokio::test]
async fn test_undecodable_frame_is_skipped() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = client(&presenter);
    client.connect(&addr, "Carol").await.unwrap();
    let mut server = accept(&listener).await;

    server.send(Bytes::from_static(b"not json")).await.unwrap();
    send(&mut server, json!({ "origin": 9, "message": { "kind": "READY" } })).await;
    send(&mut server, player_list(1)).await;

    let join = recv(&mut server).await;
    assert_eq!(join["message"]["payload"], "Carol");
    assert!(client.is_connected());
    assert_eq!(client.player_id(), Seat::new(1));
}

// =========================================================================
// Outbound actions
// =========================================================================

#[tokio::test]
async fn test_make_move_carries_local_seat() {
    let presenter = Arc::new(Recorder::default());
    let (client, mut server) = seated(&presenter).await;

    client.make_move(&[0, 1]).await.unwrap();
    assert_eq!(
        recv(&mut server).await,
        json!({ "origin": 2, "message": { "kind": "MOVE", "payload": [0, 1] } })
    );

    client.pass().await.unwrap();
    assert_eq!(
        recv(&mut server).await,
        json!({ "origin": 2, "message": { "kind": "MOVE", "payload": [] } })
    );
}

#[tokio::test]
async fn test_send_chat_has_no_origin() {
    let presenter = Arc::new(Recorder::default());
    let (client, mut server) = seated(&presenter).await;

    client.send_chat("good game").await.unwrap();

    assert_eq!(
        recv(&mut server).await,
        json!({
            "origin": -1,
            "message": { "kind": "MSG", "payload": "good game" }
        })
    );
}

#[tokio::test]
async fn test_make_move_before_seat_assignment_fails() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = client(&presenter);
    client.connect(&addr, "Carol").await.unwrap();
    let _server = accept(&listener).await;

    let result = client.make_move(&[0]).await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}

#[tokio::test]
async fn test_chat_is_shown_from_server() {
    let presenter = Arc::new(Recorder::default());
    let (_client, mut server) = seated(&presenter).await;

    let chat = json!({ "origin": -1, "message": { "kind": "MSG", "payload": "Bob: hi" } });
    send(&mut server, chat).await;
    // A round trip proves the chat line was handled first.
    let join = json!({ "origin": 2, "message": { "kind": "JOIN", "payload": "Carol" } });
    send(&mut server, join).await;
    recv(&mut server).await;

    assert_eq!(presenter.count(&Event::Chat("Bob: hi".into())), 1);
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_abrupt_close_notifies_once_and_stops_sends() {
    let presenter = Arc::new(Recorder::default());
    let (mut client, server) = seated(&presenter).await;

    drop(server);
    let end = client.wait_closed().await.unwrap();

    assert!(matches!(end, SessionEnd::Closed));
    assert!(!client.is_connected());
    assert_eq!(presenter.count(&Event::Message(NOTICE.into())), 1);
    assert_eq!(presenter.events().last(), Some(&Event::Message(NOTICE.into())));
    assert!(presenter.events().contains(&Event::Input(false)));

    let result = client.make_move(&[0]).await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
    let result = client.send_chat("anyone?").await;
    assert!(matches!(result, Err(ClientError::NotConnected)));

    client.disconnect().await.unwrap();
    assert_eq!(presenter.count(&Event::Message(NOTICE.into())), 1);
}

#[tokio::test]
async fn test_oversized_length_prefix_fails_session_once() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = BigTwoClient::builder()
        .max_frame_length(64)
        .build(NoRules, Arc::clone(&presenter));
    client.connect(&addr, "Carol").await.unwrap();
    let mut server = accept(&listener).await;

    server.get_mut().write_all(&[0xff, 0xff, 0xff, 0xff]).await.unwrap();
    let end = client.wait_closed().await.unwrap();

    assert!(matches!(end, SessionEnd::Failed(ClientError::Desync(_))));
    assert!(!client.is_connected());
    assert_eq!(presenter.count(&Event::Message(NOTICE.into())), 1);
    assert_eq!(presenter.count(&Event::Input(false)), 1);
}

#[tokio::test]
async fn test_closed_resolves_when_server_leaves() {
    let presenter = Arc::new(Recorder::default());
    let (client, server) = seated(&presenter).await;
    let closed = client.closed();

    drop(server);
    tokio::time::timeout(Duration::from_secs(5), closed)
        .await
        .expect("closed() did not resolve after the server left");

    assert!(!client.is_connected());
    assert_eq!(presenter.count(&Event::Message(NOTICE.into())), 1);
    tokio::time::timeout(Duration::from_secs(1), client.closed())
        .await
        .expect("closed() should be ready once the session is lost");
}

#[tokio::test]
async fn test_disconnect_closes_and_notifies_once() {
    let presenter = Arc::new(Recorder::default());
    let (mut client, mut server) = seated(&presenter).await;

    client.disconnect().await.unwrap();

    assert!(!client.is_connected());
    assert_eq!(presenter.count(&Event::Message(NOTICE.into())), 1);
    let next = tokio::time::timeout(Duration::from_secs(5), server.next()).await.unwrap();
    assert!(next.is_none());

    let result = client.disconnect().await;
    assert!(matches!(result, Err(ClientError::NotConnected)));
}

#[tokio::test]
async fn test_connect_twice_is_refused() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = client(&presenter);
    client.connect(&addr, "Carol").await.unwrap();
    let _server = accept(&listener).await;

    let result = client.connect(&addr, "Carol").await;
    assert!(matches!(result, Err(ClientError::AlreadyConnected)));
}

#[tokio::test]
async fn test_reconnect_after_loss() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    let mut client = client(&presenter);
    client.connect(&addr, "Carol").await.unwrap();
    drop(accept(&listener).await);
    client.wait_closed().await.unwrap();

    client.connect(&addr, "Carol").await.unwrap();
    let mut server = accept(&listener).await;
    send(&mut server, player_list(3)).await;

    assert_eq!(recv(&mut server).await["message"]["kind"], "JOIN");
    assert!(client.is_connected());
    assert_eq!(client.player_id(), Seat::new(3));
}

#[tokio::test]
async fn test_connect_refused_is_connection_error() {
    let presenter = Arc::new(Recorder::default());
    let (listener, addr) = listen().await;
    drop(listener);

    let mut client = client(&presenter);
    let result = client.connect(&addr, "Carol").await;

    assert!(matches!(result, Err(ClientError::Connection(_))));
    assert!(!client.is_connected());
    assert!(presenter.events().is_empty());
}

#[tokio::test]
async fn test_blank_name_is_refused_before_connecting() {
    let presenter = Arc::new(Recorder::default());
    let mut client = client(&presenter);

    let result = client.connect("127.0.0.1:1", "   ").await;
    assert!(matches!(result, Err(ClientError::Session(_))));
}

#[tokio::test]
async fn test_malformed_address_is_connection_error() {
    let presenter = Arc::new(Recorder::default());
    let mut client = client(&presenter);

    let result = client.connect("no-port-here", "Carol").await;
    assert!(matches!(result, Err(ClientError::Connection(_))));
}
