//! Notifier that writes alerts to the log

use crate::error::ProcessorResult;
use crate::events::MissingSignaturesAlert;
use crate::ports::outbound::Notifier;
use tracing::warn;

/// Emits missing-signature alerts as `warn!` events.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn missing_signatures(&self, alert: &MissingSignaturesAlert) -> ProcessorResult<()> {
        let missing: Vec<String> = alert.missing.iter().map(hex::encode).collect();
        warn!(
            digest = %hex::encode(alert.digest),
            message_id = %alert.message_id,
            source = %alert.source,
            guardian_set_index = alert.guardian_set_index,
            signed = alert.signed,
            required = alert.required,
            ?missing,
            "[notifier] observation failed to reach quorum"
        );
        Ok(())
    }
}
