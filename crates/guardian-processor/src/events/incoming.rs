//! Local inputs from the chain watchers

use crate::domain::{ChainId, Vaa, SUPPORTED_VAA_VERSION};
use serde::{Deserialize, Serialize};

/// A message observed on a source chain by one of our watchers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePublication {
    /// Transaction that emitted the message (logging only)
    pub tx_hash: [u8; 32],
    /// Block time in unix seconds
    pub timestamp: u32,
    pub nonce: u32,
    pub sequence: u64,
    pub consistency_level: u8,
    pub emitter_chain: ChainId,
    pub emitter_address: [u8; 32],
    pub payload: Vec<u8>,
}

impl MessagePublication {
    pub fn message_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.emitter_chain.0,
            hex::encode(self.emitter_address),
            self.sequence
        )
    }

    /// Unsigned candidate VAA quoting `guardian_set_index`.
    pub fn to_unsigned_vaa(&self, guardian_set_index: u32) -> Vaa {
        Vaa {
            version: SUPPORTED_VAA_VERSION,
            guardian_set_index,
            signatures: Vec::new(),
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_vaa_matches_publication() {
        let publication = MessagePublication {
            tx_hash: [7; 32],
            timestamp: 1_650_000_000,
            nonce: 1,
            sequence: 99,
            consistency_level: 1,
            emitter_chain: ChainId::TERRA,
            emitter_address: [2; 32],
            payload: vec![1, 2, 3],
        };

        let vaa = publication.to_unsigned_vaa(4);

        assert_eq!(vaa.guardian_set_index, 4);
        assert!(vaa.signatures.is_empty());
        assert_eq!(vaa.sequence, 99);
        assert_eq!(vaa.message_id(), publication.message_id());
    }
}
