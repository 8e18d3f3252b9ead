//! Driven ports: collaborators the processor calls out to
//!
//! None of these may block the event loop for long. Failures are logged by
//! the caller and never stop the loop.

use crate::domain::{Digest, Vaa};
use crate::error::ProcessorResult;
use crate::events::{
    MessagePublicationEvent, MissingSignaturesAlert, SettlementEvent, VaaQuorumEvent,
};
use async_trait::async_trait;
use shared_crypto::{Address, RecoverableSignature};

/// Best-effort gossip publication.
///
/// Must return immediately; a full outbound queue is reported as an error,
/// not waited on.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, message: Vec<u8>) -> ProcessorResult<()>;
}

/// Persistence of signed VAAs, keyed by digest.
#[async_trait]
pub trait AttestationStore: Send + Sync {
    /// Persist a quorum VAA. Storing the same digest twice overwrites.
    async fn store_signed_vaa(&self, vaa: &Vaa) -> ProcessorResult<()>;

    /// Whether a VAA with this digest is already stored.
    async fn has_signed_vaa(&self, digest: &Digest) -> ProcessorResult<bool>;
}

/// Sink for processor lifecycle events (dashboards, APIs).
pub trait AttestationReporter: Send + Sync {
    fn report_message_publication(&self, event: MessagePublicationEvent);

    fn report_vaa_quorum(&self, event: VaaQuorumEvent);

    fn report_settlement(&self, event: SettlementEvent);
}

/// Operator alerting.
pub trait Notifier: Send + Sync {
    /// One of our observations failed to reach quorum.
    fn missing_signatures(&self, alert: &MissingSignaturesAlert) -> ProcessorResult<()>;
}

/// This guardian's signing key.
pub trait GuardianSigner: Send + Sync {
    fn address(&self) -> Address;

    fn sign(&self, digest: &Digest) -> ProcessorResult<RecoverableSignature>;
}

/// Recovers signer identities from recoverable signatures.
pub trait SignatureVerifier: Send + Sync {
    /// Address that signed `digest`, or `None` if the signature is invalid.
    fn recover(&self, digest: &Digest, signature: &RecoverableSignature) -> Option<Address>;
}
