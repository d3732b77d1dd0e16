use std::time::Duration;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address could not be understood as an endpoint.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The remote could not be reached or refused the connection.
    #[error("could not connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote did not accept the connection in time.
    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Stream framing is corrupted; no later frame can be trusted.
    #[error("stream desynchronized: {0}")]
    Desync(String),
}

impl TransportError {
    /// Returns `true` if the byte stream can no longer be framed.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::Desync(_))
    }
}
