//! # Shared Crypto - Guardian Signing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Observation digests, address derivation |
//! | `ecdsa` | secp256k1 (recoverable) | Guardian observation signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization (EIP-2)
//! - **Recoverable signatures**: 65 bytes `r || s || v`, signer identity is the
//!   Ethereum-style address recovered from the signature itself

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{
    address_from_verifying_key, recover_address, Address, RecoverableSignature,
    Secp256k1KeyPair, RECOVERABLE_SIGNATURE_LENGTH,
};
pub use errors::CryptoError;
pub use hashing::{double_keccak256, keccak256, Hash};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
