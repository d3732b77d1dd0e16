//! Codec trait and implementations for turning envelopes into frame bodies.
//!
//! The transport moves opaque frames; the codec decides what is inside
//! them. Swapping [`JsonCodec`] for a binary format only touches this
//! module.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec is shared between the caller's
/// flow (outbound actions) and the receive loop task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame body.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame body.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature (on by default).
///
/// ## Example
///
/// ```rust
/// use bigtwo_protocol::{Codec, Envelope, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::unseated(Message::Join("Carol".into()));
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
