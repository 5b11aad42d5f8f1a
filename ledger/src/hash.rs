//! # Hashing
//!
//! Two hash functions, two jobs:
//!
//! - **Keccak-256** (the SHA3 family as deployed on account chains) derives
//!   P2PK owner hashes. It has to match what the host chain computes for the
//!   same public key, so it is not negotiable.
//! - **BLAKE3** hashes block change logs. Nothing external depends on it;
//!   we use the fast one.

use primitive_types::H256;
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// BLAKE3 of `data`.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 over several slices fed in order, without concatenating them.
pub fn blake3_hash_multi<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
