//! Message payloads.
//!
//! A [`Payload`] is the unit of data moved from a sender into a receiver's
//! mailbox. It is deliberately not `Clone`: passing it to `send` moves it, so
//! the sender cannot keep a usable handle after the hand-off, and the
//! receiver owns it outright once it is popped.

use crate::term::{DecodeError, EncodeError, Term};
use std::fmt;

/// An opaque, move-only message body.
///
/// A payload is either present, possibly with zero bytes (the encoding of
/// `()` or a unit struct), or [absent](Payload::absent). Only an absent
/// payload is rejected by the runtime's `send`.
///
/// ```
/// use wind_core::Payload;
///
/// let payload = Payload::encode(&("move".to_string(), 3u8)).unwrap();
/// let (verb, n): (String, u8) = payload.decode().unwrap();
/// assert_eq!((verb.as_str(), n), ("move", 3));
/// ```
#[derive(PartialEq, Eq)]
pub struct Payload {
    bytes: Option<Box<[u8]>>,
}

impl Payload {
    /// Wraps raw bytes.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    /// The "no payload" value.
    pub fn absent() -> Self {
        Self { bytes: None }
    }

    /// Returns `true` for [`Payload::absent`].
    pub fn is_absent(&self) -> bool {
        self.bytes.is_none()
    }

    /// Encodes a term into a payload.
    pub fn encode<T: Term>(value: &T) -> Result<Self, EncodeError> {
        value.encode().map(Self::new)
    }

    /// Decodes the payload into a term.
    pub fn decode<T: Term>(&self) -> Result<T, DecodeError> {
        T::decode(self.as_bytes())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or_default()
    }

    /// Consumes the payload, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.map(<[u8]>::into_vec).unwrap_or_default()
    }

    /// Returns `true` if the payload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            return f.write_str("Payload(absent)");
        }
        f.debug_struct("Payload").field("len", &self.len()).finish()
    }
}
