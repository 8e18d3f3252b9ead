//! Verified Action Approval (VAA)
//!
//! The VAA is the attestation this processor produces: a fixed header with
//! the guardian signatures followed by the observed body. Guardians sign the
//! body digest only, so signatures can be added without changing the digest.
//!
//! ## Wire format (big endian)
//!
//! ```text
//! u8       version
//! u32      guardian_set_index
//! u8       len(signatures)
//!   u8     guardian index
//!   [65]   r || s || v
//! u32      timestamp
//! u32      nonce
//! u16      emitter_chain
//! [32]     emitter_address
//! u64      sequence
//! u8       consistency_level
//! [..]     payload
//! ```

use super::chain::ChainId;
use super::guardian_set::GuardianSet;
use crate::error::{ProcessorError, ProcessorResult};
use shared_crypto::{
    double_keccak256, recover_address, Hash, RecoverableSignature, RECOVERABLE_SIGNATURE_LENGTH,
};

/// Digest of a VAA body; the aggregation key.
pub type Digest = Hash;

/// The only VAA version this processor produces or accepts.
pub const SUPPORTED_VAA_VERSION: u8 = 1;

const HEADER_LEN: usize = 1 + 4 + 1;
const SIGNATURE_LEN: usize = 1 + RECOVERABLE_SIGNATURE_LENGTH;
const BODY_FIXED_LEN: usize = 4 + 4 + 2 + 32 + 8 + 1;

/// Guardian signature embedded in a VAA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaaSignature {
    /// Index of the signer in the quoted guardian set
    pub index: u8,
    pub signature: RecoverableSignature,
}

/// Verified Action Approval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<VaaSignature>,

    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: ChainId,
    pub emitter_address: [u8; 32],
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
}

impl Vaa {
    /// Canonical body encoding; the signed portion.
    pub fn body_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BODY_FIXED_LEN + self.payload.len());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.emitter_chain.0.to_be_bytes());
        buf.extend_from_slice(&self.emitter_address);
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.push(self.consistency_level);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Digest guardians sign: `keccak256(keccak256(body))`.
    pub fn digest(&self) -> Digest {
        double_keccak256(&self.body_bytes())
    }

    /// Human-readable identifier `chain/emitter/sequence`.
    pub fn message_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.emitter_chain.0,
            hex::encode(self.emitter_address),
            self.sequence
        )
    }

    pub fn marshal(&self) -> ProcessorResult<Vec<u8>> {
        let count = u8::try_from(self.signatures.len()).map_err(|_| {
            ProcessorError::TooManySignatures {
                count: self.signatures.len(),
            }
        })?;

        let body = self.body_bytes();
        let mut buf =
            Vec::with_capacity(HEADER_LEN + self.signatures.len() * SIGNATURE_LEN + body.len());
        buf.push(self.version);
        buf.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        buf.push(count);
        for sig in &self.signatures {
            buf.push(sig.index);
            buf.extend_from_slice(sig.signature.as_bytes());
        }
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn unmarshal(data: &[u8]) -> ProcessorResult<Self> {
        let mut reader = Reader::new(data);

        let [version] = reader.take::<1>("version")?;
        if version != SUPPORTED_VAA_VERSION {
            return Err(ProcessorError::UnsupportedVaaVersion { version });
        }
        let guardian_set_index = u32::from_be_bytes(reader.take("guardian set index")?);
        let [count] = reader.take::<1>("signature count")?;

        let mut signatures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let [index] = reader.take::<1>("signature index")?;
            let bytes = reader.take::<RECOVERABLE_SIGNATURE_LENGTH>("signature")?;
            signatures.push(VaaSignature {
                index,
                signature: RecoverableSignature::from_bytes(bytes),
            });
        }

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp: u32::from_be_bytes(reader.take("timestamp")?),
            nonce: u32::from_be_bytes(reader.take("nonce")?),
            emitter_chain: ChainId(u16::from_be_bytes(reader.take("emitter chain")?)),
            emitter_address: reader.take("emitter address")?,
            sequence: u64::from_be_bytes(reader.take("sequence")?),
            consistency_level: reader.take::<1>("consistency level")?[0],
            payload: reader.rest().to_vec(),
        })
    }

    /// Verify the embedded signatures against `guardian_set`.
    ///
    /// Indices must be strictly increasing and each signature must recover
    /// to the guardian at its index. The signature count must reach quorum.
    pub fn verify_signatures(&self, guardian_set: &GuardianSet) -> ProcessorResult<()> {
        let need = guardian_set.quorum();
        if self.signatures.len() < need {
            return Err(ProcessorError::InsufficientSignatures {
                have: self.signatures.len(),
                need,
            });
        }

        let digest = self.digest();
        let mut last_index: Option<u8> = None;

        for sig in &self.signatures {
            if last_index.is_some_and(|last| sig.index <= last) {
                return Err(ProcessorError::InvalidVaaSignatures {
                    reason: format!("signature index {} out of order", sig.index),
                });
            }
            last_index = Some(sig.index);

            let expected = guardian_set.keys().get(sig.index as usize).ok_or_else(|| {
                ProcessorError::InvalidVaaSignatures {
                    reason: format!(
                        "signature index {} outside guardian set of {}",
                        sig.index,
                        guardian_set.len()
                    ),
                }
            })?;

            let recovered = recover_address(&digest, &sig.signature).map_err(|e| {
                ProcessorError::InvalidVaaSignatures {
                    reason: format!("signature {} unrecoverable: {}", sig.index, e),
                }
            })?;

            if &recovered != expected {
                return Err(ProcessorError::InvalidVaaSignatures {
                    reason: format!("signature {} is not from guardian {}", sig.index, hex::encode(expected)),
                });
            }
        }

        Ok(())
    }
}

/// Bounds-checked cursor over VAA bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self, field: &str) -> ProcessorResult<[u8; N]> {
        let end = self.pos + N;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| ProcessorError::MalformedVaa {
                reason: format!("truncated at {field} (offset {})", self.pos),
            })?;
        self.pos = end;

        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Secp256k1KeyPair;

    fn sample_vaa() -> Vaa {
        Vaa {
            version: SUPPORTED_VAA_VERSION,
            guardian_set_index: 3,
            signatures: Vec::new(),
            timestamp: 1_700_000_000,
            nonce: 0xdead_beef,
            emitter_chain: ChainId::SOLANA,
            emitter_address: [0x11; 32],
            sequence: 12_345,
            consistency_level: 32,
            payload: b"hello guardians".to_vec(),
        }
    }

    fn signed_by(vaa: &Vaa, keys: &[Secp256k1KeyPair], signers: &[usize]) -> Vaa {
        let digest = vaa.digest();
        let mut signed = vaa.clone();
        signed.signatures = signers
            .iter()
            .map(|&i| VaaSignature {
                index: i as u8,
                signature: keys[i].sign_prehash(&digest).unwrap(),
            })
            .collect();
        signed
    }

    fn guardians(n: usize) -> (Vec<Secp256k1KeyPair>, GuardianSet) {
        let keys: Vec<_> = (0..n).map(|_| Secp256k1KeyPair::generate()).collect();
        let set = GuardianSet::new(keys.iter().map(|k| k.address()).collect(), 3).unwrap();
        (keys, set)
    }

    #[test]
    fn test_body_layout() {
        let vaa = sample_vaa();
        let body = vaa.body_bytes();

        assert_eq!(body.len(), BODY_FIXED_LEN + vaa.payload.len());
        assert_eq!(&body[0..4], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&body[8..10], &[0, 1]);
        assert_eq!(body[50], 32);
        assert_eq!(&body[51..], b"hello guardians");
    }

    #[test]
    fn test_digest_ignores_signatures() {
        let (keys, _) = guardians(2);
        let vaa = sample_vaa();
        let signed = signed_by(&vaa, &keys, &[0, 1]);

        assert_eq!(vaa.digest(), signed.digest());
        assert_eq!(vaa.digest(), double_keccak256(&vaa.body_bytes()));
    }

    #[test]
    fn test_digest_changes_with_body() {
        let vaa = sample_vaa();
        let mut other = vaa.clone();
        other.sequence += 1;
        assert_ne!(vaa.digest(), other.digest());
    }

    #[test]
    fn test_marshal_unmarshal() {
        let (keys, _) = guardians(3);
        let vaa = signed_by(&sample_vaa(), &keys, &[0, 2]);

        let bytes = vaa.marshal().unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 2 * SIGNATURE_LEN + vaa.body_bytes().len());
        assert_eq!(Vaa::unmarshal(&bytes).unwrap(), vaa);
    }

    #[test]
    fn test_unmarshal_truncated() {
        let bytes = sample_vaa().marshal().unwrap();
        let result = Vaa::unmarshal(&bytes[..20]);
        assert!(matches!(result, Err(ProcessorError::MalformedVaa { .. })));
        assert!(matches!(Vaa::unmarshal(&[]), Err(ProcessorError::MalformedVaa { .. })));
    }

    #[test]
    fn test_unmarshal_wrong_version() {
        let mut bytes = sample_vaa().marshal().unwrap();
        bytes[0] = 2;
        assert!(matches!(
            Vaa::unmarshal(&bytes),
            Err(ProcessorError::UnsupportedVaaVersion { version: 2 })
        ));
    }

    #[test]
    fn test_message_id() {
        let id = sample_vaa().message_id();
        assert_eq!(id, format!("1/{}/12345", "11".repeat(32)));
    }

    #[test]
    fn test_verify_valid() {
        let (keys, set) = guardians(4);
        let vaa = signed_by(&sample_vaa(), &keys, &[0, 1, 3]);
        assert!(vaa.verify_signatures(&set).is_ok());
    }

    #[test]
    fn test_verify_below_quorum() {
        let (keys, set) = guardians(4);
        let vaa = signed_by(&sample_vaa(), &keys, &[0, 1]);
        assert!(matches!(
            vaa.verify_signatures(&set),
            Err(ProcessorError::InsufficientSignatures { have: 2, need: 3 })
        ));
    }

    #[test]
    fn test_verify_rejects_unordered_and_duplicate() {
        let (keys, set) = guardians(4);

        let unordered = signed_by(&sample_vaa(), &keys, &[1, 0, 2]);
        assert!(unordered.verify_signatures(&set).is_err());

        let duplicated = signed_by(&sample_vaa(), &keys, &[0, 0, 1]);
        assert!(duplicated.verify_signatures(&set).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_signer() {
        let (keys, set) = guardians(4);
        let mut vaa = signed_by(&sample_vaa(), &keys, &[0, 1, 2]);
        // Claim guardian 2's signature belongs to guardian 3
        vaa.signatures[2].index = 3;
        assert!(matches!(
            vaa.verify_signatures(&set),
            Err(ProcessorError::InvalidVaaSignatures { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_out_of_range_index() {
        let (keys, set) = guardians(3);
        let mut vaa = signed_by(&sample_vaa(), &keys, &[0, 1, 2]);
        vaa.signatures[2].index = 9;
        assert!(vaa.verify_signatures(&set).is_err());
    }
}
