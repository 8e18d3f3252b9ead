//! secp256k1 signer and verifier adapters

use crate::domain::Digest;
use crate::error::ProcessorResult;
use crate::ports::outbound::{GuardianSigner, SignatureVerifier};
use shared_crypto::{
    recover_address, Address, CryptoError, RecoverableSignature, Secp256k1KeyPair,
};

/// Guardian signing key.
pub struct Secp256k1GuardianSigner {
    keypair: Secp256k1KeyPair,
    address: Address,
}

impl Secp256k1GuardianSigner {
    /// Load from a 32-byte secret. Fails on an unusable key.
    pub fn from_secret(secret: [u8; 32]) -> Result<Self, CryptoError> {
        Ok(Self::from_keypair(Secp256k1KeyPair::from_bytes(secret)?))
    }

    /// Fresh random key, for devnets and tests.
    pub fn generate() -> Self {
        Self::from_keypair(Secp256k1KeyPair::generate())
    }

    fn from_keypair(keypair: Secp256k1KeyPair) -> Self {
        let address = keypair.address();
        Self { keypair, address }
    }
}

impl GuardianSigner for Secp256k1GuardianSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, digest: &Digest) -> ProcessorResult<RecoverableSignature> {
        Ok(self.keypair.sign_prehash(digest)?)
    }
}

/// Recovers Ethereum-style addresses from secp256k1 signatures.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcdsaSignatureVerifier;

impl SignatureVerifier for EcdsaSignatureVerifier {
    fn recover(&self, digest: &Digest, signature: &RecoverableSignature) -> Option<Address> {
        recover_address(digest, signature).ok()
    }
}
