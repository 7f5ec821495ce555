//! Payload digests for comparing chunks across files

use crc32fast::Hasher;
use sha2::{Digest, Sha256};

/// CRC32 of a chunk payload, as shown by `inspect`
#[must_use]
pub fn payload_crc32(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// SHA-256 of a chunk payload
#[must_use]
pub fn payload_sha256(payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

/// Lowercase hex SHA-256 of a chunk payload
#[must_use]
pub fn payload_sha256_hex(payload: &[u8]) -> String {
    hex::encode(payload_sha256(payload))
}
