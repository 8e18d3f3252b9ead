//! Attestation event reporter
//!
//! Fans events out to any number of subscribers. Slow subscribers lag and
//! lose events; the processor never waits for them.

use crate::events::{
    AttestationEvent, MessagePublicationEvent, SettlementEvent, VaaQuorumEvent,
};
use crate::ports::outbound::AttestationReporter;
use tokio::sync::broadcast;
use tracing::trace;

/// `AttestationReporter` over a `tokio::sync::broadcast` channel.
pub struct BroadcastAttestationReporter {
    sender: broadcast::Sender<AttestationEvent>,
}

impl BroadcastAttestationReporter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AttestationEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: AttestationEvent) {
        // No subscribers is not an error
        if self.sender.send(event).is_err() {
            trace!("[reporter] no subscribers");
        }
    }
}

impl AttestationReporter for BroadcastAttestationReporter {
    fn report_message_publication(&self, event: MessagePublicationEvent) {
        self.publish(AttestationEvent::MessagePublication(event));
    }

    fn report_vaa_quorum(&self, event: VaaQuorumEvent) {
        self.publish(AttestationEvent::VaaQuorum(event));
    }

    fn report_settlement(&self, event: SettlementEvent) {
        self.publish(AttestationEvent::Settlement(event));
    }
}
