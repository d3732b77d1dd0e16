//! Error types for the protocol layer.
//!
//! A `ProtocolError` always concerns the bytes of a single envelope. It
//! never means the connection itself is broken; framing failures are a
//! transport concern.

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// One frame could not be turned into an envelope: malformed JSON, an
    /// unknown kind, a payload that does not match its kind, or an origin
    /// off the table.
    ///
    /// The receive loop logs and skips these; later frames are unaffected.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
