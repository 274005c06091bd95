//! JSON in and out of the protocol layer.
//!
//! Every envelope goes through these two functions so the error mapping is
//! the same everywhere: a body that does not match its envelope is a
//! [`ProtocolError::Decode`] ("invalid JSON format"), and a value that
//! cannot be written is a [`ProtocolError::Encode`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Parses `data` as the envelope `T`.
pub(crate) fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}

/// Serializes `value` into a request body.
pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(ProtocolError::Encode)
}
