//! Length-prefixed TCP transport using `tokio-util`'s framing codec.

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::{ConnectOptions, Connection, ConnectionId, TransportError};

type FramedTcp = Framed<TcpStream, LengthDelimitedCodec>;

/// Builds the frame codec both ends of a TCP session must agree on:
/// a 4-byte big-endian length, then that many bytes of body.
pub fn frame_codec(max_frame_length: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_length)
        .new_codec()
}

/// A framed TCP connection to the game server.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<SplitSink<FramedTcp, Bytes>>,
    reader: Mutex<SplitStream<FramedTcp>>,
}

impl TcpConnection {
    /// Connects to `addr` (`host:port`) within `options.timeout`.
    pub async fn connect(addr: &str, options: &ConnectOptions) -> Result<Self, TransportError> {
        let stream = match tokio::time::timeout(options.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(TransportError::ConnectFailed {
                    addr: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout: options.timeout,
                });
            }
        };

        let conn = Self::from_stream(stream, options.max_frame_length)
            .map_err(|source| TransportError::ConnectFailed {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!(id = %conn.id, peer = %conn.peer, "TCP connection established");
        Ok(conn)
    }

    /// Wraps an already-connected stream.
    pub fn from_stream(stream: TcpStream, max_frame_length: usize) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (writer, reader) = Framed::new(stream, frame_codec(max_frame_length)).split();
        Ok(Self {
            id: ConnectionId::next(),
            peer,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .send(Bytes::copy_from_slice(data))
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let frame = self.reader.lock().await.next().await;
        match frame {
            Some(Ok(data)) => Ok(Some(data.to_vec())),
            // The codec reports an impossible length prefix as InvalidData.
            // Past that point byte boundaries are unknown.
            Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Err(TransportError::Desync(e.to_string()))
            }
            Some(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
