//! # Keccak-256 Hashing
//!
//! Ethereum-compatible Keccak-256 (pre-NIST padding), used for observation
//! digests and for deriving guardian addresses from public keys.

use sha3::{Digest, Keccak256};

/// Keccak-256 hash output (256-bit).
pub type Hash = [u8; 32];

/// Hash data with Keccak-256 (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    Keccak256::digest(data).into()
}

/// Keccak-256 applied twice; the digest guardians sign.
pub fn double_keccak256(data: &[u8]) -> Hash {
    keccak256(&keccak256(data))
}
