//! CBOR serialization for instance state.
//!
//! - CBOR via `ciborium`
//! - Deterministic encoding, so a snapshot digest is stable
//! - Schema evolution through `#[serde(default)]`

pub mod snapshot;

pub use snapshot::{
    decode_snapshot, encode_snapshot, load_snapshot, save_snapshot, Snapshot,
    SNAPSHOT_FORMAT_VERSION,
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),

    /// Payload does not match the digest recorded in the envelope.
    #[error("Snapshot digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    /// Decoded state failed its integrity checks.
    #[error("Snapshot holds an invalid state: {0}")]
    InvalidState(#[from] crate::error::AllocationError),

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}
