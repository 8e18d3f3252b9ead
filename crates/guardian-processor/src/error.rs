//! Error types for the aggregation processor

use shared_crypto::{Address, CryptoError};
use thiserror::Error;

/// Processor errors
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Shutdown was requested; the only terminal result of the event loop
    #[error("Processor cancelled")]
    Cancelled,

    /// No guardian set has been received yet
    #[error("No guardian set known yet")]
    NoGuardianSet,

    /// Guardian set exceeds what a VAA signature index can address
    #[error("Guardian set too large: {size} keys (max {max})")]
    GuardianSetTooLarge { size: usize, max: usize },

    /// Guardian set lists the same key more than once
    #[error("Duplicate guardian key {key}")]
    DuplicateGuardianKey { key: String },

    /// Remote VAA quotes a guardian set we do not know
    #[error("Unknown guardian set index {index}")]
    UnknownGuardianSet { index: u32 },

    /// VAA bytes could not be decoded
    #[error("Malformed VAA: {reason}")]
    MalformedVaa { reason: String },

    /// VAA version is not supported
    #[error("Unsupported VAA version {version}")]
    UnsupportedVaaVersion { version: u8 },

    /// VAA carries more signatures than the wire format allows
    #[error("Too many signatures for a VAA: {count}")]
    TooManySignatures { count: usize },

    /// Embedded VAA signatures did not verify
    #[error("Invalid VAA signatures: {reason}")]
    InvalidVaaSignatures { reason: String },

    /// VAA does not carry enough signatures for its guardian set
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },

    /// Observation signature could not be parsed or recovered
    #[error("Invalid observation signature from {guardian}")]
    InvalidObservationSignature { guardian: String },

    /// Observation signature recovered to a different guardian than claimed
    #[error("Observation signer mismatch: claimed {claimed}, recovered {recovered}")]
    SignerMismatch { claimed: String, recovered: String },

    /// Observation signer is not a member of any known guardian set
    #[error("Observation from unknown guardian {guardian}")]
    UnknownGuardian { guardian: String },

    /// Gossip envelope encoding or decoding failed
    #[error("Gossip encoding failed: {reason}")]
    GossipEncoding { reason: String },

    /// Local signing failed
    #[error("Signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// Outbound broadcast could not be enqueued
    #[error("Broadcast failed: {reason}")]
    BroadcastFailed { reason: String },

    /// Persistence of a signed VAA failed
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    /// Alert delivery failed
    #[error("Notification failed: {reason}")]
    NotificationFailed { reason: String },

    /// Configuration is unusable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ProcessorError {
    /// Error caused by unauthenticated network input.
    ///
    /// These are expected on an adversarial network and never fatal.
    pub fn is_untrusted_input(&self) -> bool {
        matches!(
            self,
            ProcessorError::UnknownGuardianSet { .. }
                | ProcessorError::MalformedVaa { .. }
                | ProcessorError::UnsupportedVaaVersion { .. }
                | ProcessorError::InvalidVaaSignatures { .. }
                | ProcessorError::InsufficientSignatures { .. }
                | ProcessorError::InvalidObservationSignature { .. }
                | ProcessorError::SignerMismatch { .. }
                | ProcessorError::UnknownGuardian { .. }
        )
    }

    pub(crate) fn signer_mismatch(claimed: &Address, recovered: &Address) -> Self {
        ProcessorError::SignerMismatch {
            claimed: hex::encode(claimed),
            recovered: hex::encode(recovered),
        }
    }
}

/// Result type for processor operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;
