//! Snapshot envelope for persisting an instance.
//!
//! The payload is the CBOR-encoded `MechanismState`; the envelope carries a
//! format version and the SHA-256 of the payload, checked on load.

use super::{from_cbor, to_cbor, SerializationError};
use crate::mechanism::MechanismState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    /// Hex SHA-256 of `payload`.
    pub digest: String,
    #[serde(with = "serde_bytes_compat")]
    pub payload: Vec<u8>,
}

fn digest_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

pub fn encode_snapshot(state: &MechanismState) -> Result<Vec<u8>, SerializationError> {
    let payload = to_cbor(state)?;
    let snapshot = Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        digest: digest_hex(&payload),
        payload,
    };
    to_cbor(&snapshot)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<MechanismState, SerializationError> {
    let snapshot: Snapshot = from_cbor(bytes)?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SerializationError::UnsupportedVersion(snapshot.format_version));
    }
    let actual = digest_hex(&snapshot.payload);
    if actual != snapshot.digest {
        return Err(SerializationError::DigestMismatch {
            expected: snapshot.digest,
            actual,
        });
    }
    // The digest only catches corruption; anyone can recompute it.
    let state: MechanismState = from_cbor(&snapshot.payload)?;
    state.check_integrity()?;
    Ok(state)
}

pub fn save_snapshot(path: &Path, state: &MechanismState) -> Result<(), SerializationError> {
    let bytes = encode_snapshot(state)?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<MechanismState, SerializationError> {
    let bytes = std::fs::read(path)?;
    decode_snapshot(&bytes)
}

/// Encode the payload as a CBOR byte string rather than an array of integers.
mod serde_bytes_compat {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a byte string")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
                Ok(v)
            }
        }

        deserializer.deserialize_byte_buf(BytesVisitor)
    }
}
