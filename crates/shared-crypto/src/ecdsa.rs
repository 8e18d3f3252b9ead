//! # ECDSA Signatures (secp256k1, recoverable)
//!
//! Guardian identities are Ethereum-style addresses. A guardian signs a
//! 32-byte digest (prehash) and peers recover the signing address from the
//! 65-byte `r || s || v` signature, so no public key travels on the wire.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization (EIP-2); high-S signatures fail recovery
//! - Recovery id accepted as `0/1` or legacy `27/28`

use crate::hashing::{keccak256, Hash};
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;
use zeroize::Zeroize;

/// Ethereum-style address (last 20 bytes of keccak256(uncompressed pubkey)).
pub type Address = [u8; 20];

/// Length of a recoverable signature (`r || s || v`).
pub const RECOVERABLE_SIGNATURE_LENGTH: usize = 65;

/// Recoverable secp256k1 signature (65 bytes, `r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature([u8; RECOVERABLE_SIGNATURE_LENGTH]);

impl RecoverableSignature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; RECOVERABLE_SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from an untrusted slice, rejecting any length other than 65.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; RECOVERABLE_SIGNATURE_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureFormat {
                    expected: RECOVERABLE_SIGNATURE_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; RECOVERABLE_SIGNATURE_LENGTH] {
        &self.0
    }

    /// Recovery id byte (`v`).
    pub fn v(&self) -> u8 {
        self.0[64]
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature(0x{}..)", hex::encode(&self.0[..8]))
    }
}

/// Derive the Ethereum-style address of a public key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point prefix
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Recover the address that produced `signature` over `prehash`.
pub fn recover_address(
    prehash: &Hash,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let v = match signature.v() {
        27 | 28 => signature.v() - 27,
        v => v,
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidSignature)?;

    let sig = Signature::from_slice(&signature.0[..64]).map_err(|_| CryptoError::InvalidSignature)?;

    let key = VerifyingKey::recover_from_prehash(prehash, &sig, recovery_id)
        .map_err(|_| CryptoError::SignatureVerificationFailed)?;

    Ok(address_from_verifying_key(&key))
}

/// secp256k1 guardian keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret key bytes (32 bytes). The input copy is wiped.
    pub fn from_bytes(mut bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let result = SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey);
        bytes.zeroize();
        Ok(Self {
            signing_key: result?,
        })
    }

    /// Address of this keypair.
    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte digest (deterministic RFC 6979), returning `r || s || v`.
    pub fn sign_prehash(&self, prehash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut bytes = [0u8; RECOVERABLE_SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("address", &hex::encode(self.address()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_recover() {
        let keypair = Secp256k1KeyPair::generate();
        let digest = keccak256(b"Hello, secp256k1!");

        let signature = keypair.sign_prehash(&digest).unwrap();
        let recovered = recover_address(&digest, &signature).unwrap();

        assert_eq!(recovered, keypair.address());
    }

    #[test]
    fn test_wrong_digest_recovers_other_address() {
        let keypair = Secp256k1KeyPair::generate();

        let signature = keypair.sign_prehash(&keccak256(b"message1")).unwrap();
        let recovered = recover_address(&keccak256(b"message2"), &signature);

        assert!(recovered.map(|a| a != keypair.address()).unwrap_or(true));
    }

    #[test]
    fn test_legacy_v_accepted() {
        let keypair = Secp256k1KeyPair::from_bytes([0x11u8; 32]).unwrap();
        let digest = keccak256(b"legacy");

        let mut bytes = *keypair.sign_prehash(&digest).unwrap().as_bytes();
        bytes[64] += 27;

        let recovered = recover_address(&digest, &RecoverableSignature::from_bytes(bytes)).unwrap();
        assert_eq!(recovered, keypair.address());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let digest = keccak256(b"garbage");
        let signature = RecoverableSignature::from_bytes([0u8; 65]);

        assert!(recover_address(&digest, &signature).is_err());
    }

    #[test]
    fn test_from_slice_rejects_bad_length() {
        let err = RecoverableSignature::from_slice(&[1u8; 64]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidSignatureFormat {
                expected: 65,
                actual: 64
            }
        ));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = Secp256k1KeyPair::from_bytes([0xABu8; 32]).unwrap();
        let digest = keccak256(b"deterministic test");

        let sig1 = keypair.sign_prehash(&digest).unwrap();
        let sig2 = keypair.sign_prehash(&digest).unwrap();

        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_roundtrip_bytes() {
        let original = Secp256k1KeyPair::generate();
        let restored = Secp256k1KeyPair::from_bytes(original.to_bytes()).unwrap();

        assert_eq!(original.address(), restored.address());
    }

    #[test]
    fn test_zero_key_rejected() {
        assert!(matches!(
            Secp256k1KeyPair::from_bytes([0u8; 32]),
            Err(CryptoError::InvalidPrivateKey)
        ));
    }
}
