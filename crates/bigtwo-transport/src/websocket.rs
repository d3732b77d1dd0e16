//! WebSocket client transport using `tokio-tungstenite`.

use std::io;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ConnectOptions, Connection, ConnectionId, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket connection to the game server.
pub struct WebSocketConnection {
    id: ConnectionId,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Performs the WebSocket handshake with `url` within `options.timeout`.
    pub async fn connect(url: &str, options: &ConnectOptions) -> Result<Self, TransportError> {
        let handshake = tokio_tungstenite::connect_async(url);
        let ws = match tokio::time::timeout(options.timeout, handshake).await {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                return Err(TransportError::ConnectFailed {
                    addr: url.to_string(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, e),
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: url.to_string(),
                    timeout: options.timeout,
                });
            }
        };

        let id = ConnectionId::next();
        tracing::debug!(%id, url, "WebSocket connection established");

        let (writer, reader) = ws.split();
        Ok(Self {
            id,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        self.writer.lock().await.send(msg).await.map_err(broken_pipe)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                )) => return Ok(None),
                Some(Err(
                    e @ (tungstenite::Error::Protocol(_) | tungstenite::Error::Capacity(_)),
                )) => return Err(TransportError::Desync(e.to_string())),
                Some(Err(e)) => {
                    let reset = io::Error::new(io::ErrorKind::ConnectionReset, e);
                    return Err(TransportError::ReceiveFailed(reset));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer.lock().await.close().await.map_err(broken_pipe)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

fn broken_pipe(e: tungstenite::Error) -> TransportError {
    TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, e))
}
