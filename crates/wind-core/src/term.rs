//! Term serialization.
//!
//! The runtime treats message payloads as opaque bytes. Application code that
//! wants to move typed values between processes encodes them into a
//! [`Payload`](crate::Payload) before sending and decodes them after
//! receiving. Any `Serialize + DeserializeOwned` type is a [`Term`];
//! encoding uses `postcard`.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Error type for term encoding failures.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Failed to serialize the value.
    #[error("failed to encode term: {0}")]
    Serialize(#[from] postcard::Error),
}

/// Error type for term decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to deserialize the term bytes.
    #[error("failed to decode term: {0}")]
    Deserialize(#[from] postcard::Error),
}

/// A value that can be serialized and carried in a message payload.
///
/// Implemented for every type that is `Serialize + DeserializeOwned + Send`.
///
/// ```
/// use wind_core::Term;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct Ping {
///     seq: u32,
/// }
///
/// let bytes = Ping { seq: 7 }.encode().unwrap();
/// assert_eq!(Ping::decode(&bytes).unwrap(), Ping { seq: 7 });
/// ```
pub trait Term: Sized + Send + 'static {
    /// Encodes this term into bytes.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError` if the value cannot be serialized.
    fn encode(&self) -> Result<Vec<u8>, EncodeError>;

    /// Decodes a term from bytes.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the bytes cannot be deserialized into this type.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError>;
}

impl<T> Term for T
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        postcard::to_allocvec(self).map_err(EncodeError::from)
    }

    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        postcard::from_bytes(bytes).map_err(DecodeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Command {
        Login { user: String },
        Move(i32, i32),
        Logout,
    }

    #[test]
    fn test_encode_decode_enum() {
        for cmd in [
            Command::Login {
                user: "ada".to_string(),
            },
            Command::Move(-3, 9),
            Command::Logout,
        ] {
            let bytes = cmd.encode().unwrap();
            assert_eq!(Command::decode(&bytes).unwrap(), cmd);
        }
    }

    #[test]
    fn test_decode_error() {
        let result = Command::decode(&[0xFF, 0xFF, 0xFF]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tuple_terms() {
        let msg = (42u32, "hello".to_string(), true);
        let bytes = msg.encode().unwrap();
        let decoded = <(u32, String, bool)>::decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }
}
