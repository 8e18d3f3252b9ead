//! Ports (hexagonal architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::{processor_channels, ProcessorInputs, ProcessorReceivers};
pub use outbound::{
    AttestationReporter, AttestationStore, Broadcaster, GuardianSigner, Notifier,
    SignatureVerifier,
};
