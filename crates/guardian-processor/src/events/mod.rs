//! Events consumed and produced by the processor

pub mod gossip;
pub mod incoming;
pub mod outgoing;

pub use gossip::{GossipMessage, SignedObservation, SignedVaaWithQuorum};
pub use incoming::MessagePublication;
pub use outgoing::{
    AttestationEvent, MessagePublicationEvent, MissingSignaturesAlert, SettlementEvent,
    SettlementOutcome, VaaQuorumEvent,
};
