//! Driving side: the channels producers use to feed the event loop
//!
//! Every input is a bounded `mpsc` queue drained by the single event loop.
//! Producers clone `ProcessorInputs`; the loop owns `ProcessorReceivers`.

use crate::domain::{GuardianSet, Vaa};
use crate::events::{MessagePublication, SignedObservation, SignedVaaWithQuorum};
use tokio::sync::mpsc;

/// Producer handles for every processor input.
#[derive(Clone, Debug)]
pub struct ProcessorInputs {
    /// Local watcher observations
    pub observations: mpsc::Sender<MessagePublication>,
    /// Pre-built VAAs to sign (governance, re-observation)
    pub injections: mpsc::Sender<Vaa>,
    /// Guardian set rotations
    pub guardian_sets: mpsc::Sender<GuardianSet>,
    /// Peer signatures from gossip
    pub signed_observations: mpsc::Sender<SignedObservation>,
    /// Finished VAAs from gossip
    pub signed_vaas: mpsc::Sender<SignedVaaWithQuorum>,
}

/// Loop side of the input channels.
#[derive(Debug)]
pub struct ProcessorReceivers {
    pub observations: mpsc::Receiver<MessagePublication>,
    pub injections: mpsc::Receiver<Vaa>,
    pub guardian_sets: mpsc::Receiver<GuardianSet>,
    pub signed_observations: mpsc::Receiver<SignedObservation>,
    pub signed_vaas: mpsc::Receiver<SignedVaaWithQuorum>,
}

/// Create all input channels with the same `capacity`.
///
/// # Panics
///
/// If `capacity` is zero, as `tokio::sync::mpsc::channel` does.
pub fn processor_channels(capacity: usize) -> (ProcessorInputs, ProcessorReceivers) {
    let (observations_tx, observations_rx) = mpsc::channel(capacity);
    let (injections_tx, injections_rx) = mpsc::channel(capacity);
    let (guardian_sets_tx, guardian_sets_rx) = mpsc::channel(capacity);
    let (signed_observations_tx, signed_observations_rx) = mpsc::channel(capacity);
    let (signed_vaas_tx, signed_vaas_rx) = mpsc::channel(capacity);

    (
        ProcessorInputs {
            observations: observations_tx,
            injections: injections_tx,
            guardian_sets: guardian_sets_tx,
            signed_observations: signed_observations_tx,
            signed_vaas: signed_vaas_tx,
        },
        ProcessorReceivers {
            observations: observations_rx,
            injections: injections_rx,
            guardian_sets: guardian_sets_rx,
            signed_observations: signed_observations_rx,
            signed_vaas: signed_vaas_rx,
        },
    )
}
