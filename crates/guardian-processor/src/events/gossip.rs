//! Gossip messages exchanged between guardians
//!
//! Encoded with bincode. The transport treats the bytes as opaque.

use crate::domain::Digest;
use crate::error::{ProcessorError, ProcessorResult};
use serde::{Deserialize, Serialize};
use shared_crypto::Address;

/// One guardian's signature over an observation digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedObservation {
    /// Claimed signer
    pub addr: Address,
    /// Observation digest
    pub hash: Digest,
    /// `r || s || v`; length is checked on receipt
    pub signature: Vec<u8>,
    /// Source transaction, informational
    pub tx_hash: Vec<u8>,
    pub message_id: String,
}

/// A fully signed VAA that reached quorum somewhere on the network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVaaWithQuorum {
    /// Marshalled VAA
    pub vaa: Vec<u8>,
}

/// Envelope for everything the processor puts on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GossipMessage {
    SignedObservation(SignedObservation),
    SignedVaaWithQuorum(SignedVaaWithQuorum),
}

impl GossipMessage {
    pub fn encode(&self) -> ProcessorResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ProcessorError::GossipEncoding {
            reason: e.to_string(),
        })
    }

    pub fn decode(bytes: &[u8]) -> ProcessorResult<Self> {
        bincode::deserialize(bytes).map_err(|e| ProcessorError::GossipEncoding {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_envelope() {
        let msg = GossipMessage::SignedObservation(SignedObservation {
            addr: [1; 20],
            hash: [2; 32],
            signature: vec![3; 65],
            tx_hash: vec![4; 32],
            message_id: "2/00/1".to_string(),
        });

        let bytes = msg.encode().unwrap();
        assert_eq!(GossipMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            GossipMessage::decode(&[0xff, 0xff, 0xff, 0xff, 0xff]),
            Err(ProcessorError::GossipEncoding { .. })
        ));
    }
}
