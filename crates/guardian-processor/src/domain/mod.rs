//! Domain layer: guardian sets, VAAs, quorum and aggregation state

pub mod aggregation;
pub mod chain;
pub mod guardian_set;
pub mod quorum;
pub mod vaa;

pub use aggregation::{AggregationRecord, AggregationTable};
pub use chain::ChainId;
pub use guardian_set::{GuardianSet, GuardianSetState, MAX_GUARDIAN_COUNT};
pub use quorum::{assemble_vaa, calculate_quorum, evaluate_quorum, has_quorum, QuorumEvaluation};
pub use vaa::{Digest, Vaa, VaaSignature, SUPPORTED_VAA_VERSION};
