//! # guardian-processor
//!
//! Signature aggregation core of a guardian node.
//!
//! ## Overview
//!
//! Each guardian independently observes messages on source chains, signs
//! the digest of the message body and gossips its signature. This crate:
//! - **Aggregates** signatures per digest from local and remote guardians
//! - **Evaluates quorum**: strictly more than 2/3 of the active guardian set
//! - **Assembles** the multi-signed VAA and broadcasts/persists it once
//! - **Retries and settles** stuck observations on a cleanup ticker
//!
//! ## Architecture
//!
//! ```text
//! watchers ──MessagePublication──┐
//! admin ─────────Vaa─────────────┤
//! governance ───GuardianSet──────┼──→ Processor (event loop) ──→ Broadcaster
//! gossip ─────SignedObservation──┤         │                 ──→ AttestationStore
//! gossip ───SignedVaaWithQuorum──┘         │                 ──→ AttestationReporter
//!                                          └── GuardianSetState (read by anyone)
//! ```
//!
//! All aggregation state is owned by a single task; producers talk to it
//! only through bounded channels.
//!
//! ## Example
//!
//! ```rust,ignore
//! use guardian_processor::{processor_channels, Processor, ProcessorConfig};
//!
//! let (inputs, receivers) = processor_channels(config.channel_capacity);
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let processor = Processor::new(config, deps, receivers, guardian_set_state, shutdown_rx)?;
//! let handle = tokio::spawn(processor.run());
//!
//! inputs.guardian_sets.send(guardian_set).await?;
//! inputs.observations.send(publication).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod processor;
pub mod service;

pub use config::ProcessorConfig;
pub use domain::{
    calculate_quorum, AggregationRecord, AggregationTable, ChainId, Digest, GuardianSet,
    GuardianSetState, Vaa, VaaSignature,
};
pub use error::{ProcessorError, ProcessorResult};
pub use events::{MessagePublication, SignedObservation, SignedVaaWithQuorum};
pub use ports::inbound::{processor_channels, ProcessorInputs, ProcessorReceivers};
pub use processor::Processor;
pub use service::{CleanupSummary, ProcessorDependencies, ProcessorService};
