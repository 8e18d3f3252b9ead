//! Events reported to observers of the processor

use crate::domain::{ChainId, Digest};
use serde::{Deserialize, Serialize};
use shared_crypto::Address;

/// We signed a locally observed message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePublicationEvent {
    pub digest: Digest,
    pub message_id: String,
    pub emitter_chain: ChainId,
    pub guardian_set_index: u32,
}

/// A quorum VAA was assembled and submitted by this guardian.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaaQuorumEvent {
    pub digest: Digest,
    pub message_id: String,
    pub guardian_set_index: u32,
    pub signature_count: usize,
    /// Marshalled VAA
    pub vaa: Vec<u8>,
}

/// Outcome recorded when cleanup settles a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementOutcome {
    /// Quorum was reached
    Submitted,
    /// Retries exhausted without quorum
    Missed,
}

/// Cleanup reconciled a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub digest: Digest,
    pub source: String,
    pub outcome: SettlementOutcome,
    pub observed: bool,
    pub signers: Vec<Address>,
    pub missing: Vec<Address>,
}

/// Any event an `AttestationReporter` may forward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationEvent {
    MessagePublication(MessagePublicationEvent),
    VaaQuorum(VaaQuorumEvent),
    Settlement(SettlementEvent),
}

/// Alert raised when one of our observations never reached quorum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSignaturesAlert {
    pub digest: Digest,
    pub message_id: String,
    pub source: String,
    pub guardian_set_index: u32,
    pub signed: usize,
    pub required: usize,
    /// Guardians whose signature never arrived
    pub missing: Vec<Address>,
}
