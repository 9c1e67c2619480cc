// Location: farm-bridge/src/msgpack.rs
// Purpose: MessagePack encoding for payloads sent to and received from the game peer
// Why: Named-field encoding keeps payloads readable by peers that decode into maps

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::BridgeError;

/// Encode a message with named fields
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, BridgeError> {
    Ok(rmp_serde::to_vec_named(message)?)
}

/// Decode a message previously produced by [`encode`] or by the peer
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BridgeError> {
    Ok(rmp_serde::from_slice(bytes)?)
}
