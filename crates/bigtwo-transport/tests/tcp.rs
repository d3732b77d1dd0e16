//! Integration tests for the length-prefixed TCP transport.
//!
//! Each test binds a loopback listener on an OS-assigned port and plays
//! the server side with a raw `Framed` stream, so the client is exercised
//! against real sockets and the real frame format.

use std::time::Duration;

use bigtwo_transport::{
    ConnectOptions, Connection, Endpoint, TcpConnection, TransportError,
    connect, frame_codec,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

type ServerSide = Framed<TcpStream, tokio_util::codec::LengthDelimitedCodec>;

/// Binds a listener and returns it with its `host:port`.
async fn listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr").to_string();
    (listener, addr)
}

async fn accept_framed(listener: &TcpListener) -> ServerSide {
    let (stream, _) = listener.accept().await.expect("accept");
    Framed::new(stream, frame_codec(1024 * 1024))
}

#[tokio::test]
async fn test_tcp_send_and_receive_frames() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move { accept_framed(&listener).await });

    let conn = TcpConnection::connect(&addr, &ConnectOptions::default())
        .await
        .expect("should connect");
    let mut server = server.await.expect("task should complete");

    // --- Client sends, server receives ---
    conn.send(b"hello from client").await.expect("send");
    let frame = server.next().await.unwrap().unwrap();
    assert_eq!(frame.as_ref(), b"hello from client");

    // --- Server sends, client receives ---
    server
        .send(Bytes::from_static(b"hello from server"))
        .await
        .unwrap();
    let received = conn.recv().await.expect("recv").expect("frame");
    assert_eq!(received, b"hello from server");
}

#[tokio::test]
async fn test_tcp_frames_keep_their_boundaries() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move { accept_framed(&listener).await });

    let conn = TcpConnection::connect(&addr, &ConnectOptions::default())
        .await
        .unwrap();
    let mut server = server.await.unwrap();

    server.send(Bytes::from_static(b"one")).await.unwrap();
    server.send(Bytes::from_static(b"")).await.unwrap();
    server.send(Bytes::from_static(b"three")).await.unwrap();

    assert_eq!(conn.recv().await.unwrap().unwrap(), b"one");
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"");
    assert_eq!(conn.recv().await.unwrap().unwrap(), b"three");
}

#[tokio::test]
async fn test_tcp_recv_returns_none_on_server_close() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move { accept_framed(&listener).await });

    let conn = TcpConnection::connect(&addr, &ConnectOptions::default())
        .await
        .unwrap();
    drop(server.await.unwrap());

    let result = conn.recv().await.expect("clean close is not an error");
    assert!(result.is_none());
}

#[tokio::test]
async fn test_tcp_oversized_length_prefix_is_desync() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Claims a 2 GiB frame.
        stream.write_all(&[0x80, 0, 0, 0, 1, 2, 3]).await.unwrap();
        stream
    });

    let options = ConnectOptions {
        max_frame_length: 64,
        ..ConnectOptions::default()
    };
    let conn = TcpConnection::connect(&addr, &options).await.unwrap();
    let _server = server.await.unwrap();

    let err = conn.recv().await.expect_err("should desync");
    assert!(err.is_desync(), "got {err:?}");
}

#[tokio::test]
async fn test_tcp_concurrent_sends_do_not_interleave() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move { accept_framed(&listener).await });

    let conn = std::sync::Arc::new(
        TcpConnection::connect(&addr, &ConnectOptions::default())
            .await
            .unwrap(),
    );
    let mut server = server.await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let conn = std::sync::Arc::clone(&conn);
        tasks.push(tokio::spawn(async move {
            conn.send(&vec![i; 4096]).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for _ in 0..8 {
        let frame = server.next().await.unwrap().unwrap();
        assert_eq!(frame.len(), 4096);
        assert!(frame.iter().all(|b| *b == frame[0]));
    }
}

#[tokio::test]
async fn test_tcp_connect_refused_is_connect_failed() {
    // Bind then drop to get a port nobody listens on.
    let (listener, addr) = listener().await;
    drop(listener);

    let result = TcpConnection::connect(&addr, &ConnectOptions::default()).await;
    assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
}

#[tokio::test]
async fn test_connect_dispatches_on_endpoint() {
    let (listener, addr) = listener().await;
    let server = tokio::spawn(async move { accept_framed(&listener).await });

    let endpoint: Endpoint = format!("tcp://{addr}").parse().unwrap();
    let options = ConnectOptions {
        timeout: Duration::from_secs(2),
        ..ConnectOptions::default()
    };
    let conn = connect(&endpoint, &options).await.expect("should connect");
    let mut server = server.await.unwrap();

    conn.send(b"ping").await.unwrap();
    assert_eq!(server.next().await.unwrap().unwrap().as_ref(), b"ping");
    conn.close().await.expect("close should succeed");
}
