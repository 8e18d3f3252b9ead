//! Prometheus metrics for the guardian node.
//!
//! All metrics follow the naming convention: `guardian_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., observations_received_total)
//! - **Gauge**: Value that can go up or down (e.g., aggregation_state_entries)

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OBSERVATION METRICS
    // =========================================================================

    /// Signed observations received from the network
    pub static ref OBSERVATIONS_RECEIVED: IntCounter = IntCounter::new(
        "guardian_processor_observations_received_total",
        "Total number of signed observations received"
    ).expect("metric creation failed");

    /// Signed observations dropped, by reason
    pub static ref OBSERVATIONS_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("guardian_processor_observations_failed_total", "Signed observations dropped"),
        &["reason"]  // reason: invalid_signature, signer_mismatch, no_guardian_set
    ).expect("metric creation failed");

    /// Message publications observed and signed locally
    pub static ref MESSAGES_SIGNED: IntCounterVec = IntCounterVec::new(
        Opts::new("guardian_processor_messages_signed_total", "Messages observed and signed by this guardian"),
        &["emitter_chain"]
    ).expect("metric creation failed");

    /// Locally injected VAAs signed
    pub static ref VAA_INJECTIONS: IntCounter = IntCounter::new(
        "guardian_processor_vaa_injections_total",
        "Total number of injected VAAs signed"
    ).expect("metric creation failed");

    /// VAAs that reached quorum and were submitted by this guardian
    pub static ref VAA_QUORUM: IntCounterVec = IntCounterVec::new(
        Opts::new("guardian_processor_vaa_quorum_total", "VAAs submitted after reaching quorum"),
        &["emitter_chain"]
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNED VAA METRICS
    // =========================================================================

    /// Quorum-complete VAAs received from peers
    pub static ref SIGNED_VAA_RECEIVED: IntCounter = IntCounter::new(
        "guardian_processor_signed_vaa_received_total",
        "Total number of quorum-complete VAAs received from peers"
    ).expect("metric creation failed");

    /// Quorum-complete VAAs dropped, by reason
    pub static ref SIGNED_VAA_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("guardian_processor_signed_vaa_failed_total", "Quorum-complete VAAs dropped"),
        &["reason"]  // reason: decode, unknown_guardian_set, invalid_signatures, no_quorum
    ).expect("metric creation failed");

    // =========================================================================
    // AGGREGATION STATE METRICS
    // =========================================================================

    /// Records currently held in the aggregation table
    pub static ref AGGREGATION_STATE_ENTRIES: IntGauge = IntGauge::new(
        "guardian_aggregation_state_entries",
        "Number of digests in the aggregation table"
    ).expect("metric creation failed");

    /// Settled records evicted after the retention window
    pub static ref AGGREGATION_STATE_EXPIRED: IntCounter = IntCounter::new(
        "guardian_aggregation_state_expired_total",
        "Settled records evicted from the aggregation table"
    ).expect("metric creation failed");

    /// Records settled without ever reaching quorum locally
    pub static ref AGGREGATION_STATE_TIMEOUT: IntCounter = IntCounter::new(
        "guardian_aggregation_state_timeout_total",
        "Records settled after exhausting retries without quorum"
    ).expect("metric creation failed");

    /// Records settled that this guardian never observed itself
    pub static ref AGGREGATION_STATE_UNOBSERVED: IntCounter = IntCounter::new(
        "guardian_aggregation_state_unobserved_total",
        "Records settled without a local observation"
    ).expect("metric creation failed");

    /// Signatures that arrived after the record was settled
    pub static ref AGGREGATION_STATE_LATE: IntCounter = IntCounter::new(
        "guardian_aggregation_state_late_total",
        "Signatures received for already settled records"
    ).expect("metric creation failed");

    /// Retransmissions of our own observation
    pub static ref AGGREGATION_STATE_RETRIES: IntCounter = IntCounter::new(
        "guardian_aggregation_state_retries_total",
        "Own observation retransmissions"
    ).expect("metric creation failed");

    /// Per-guardian fulfillment at settlement time
    pub static ref AGGREGATION_STATE_FULFILLMENT: CounterVec = CounterVec::new(
        Opts::new("guardian_aggregation_state_settled_signatures_total", "Signature presence per guardian at settlement"),
        &["addr", "origin", "status"]  // status: present/missing
    ).expect("metric creation failed");

    // =========================================================================
    // SIDE EFFECT METRICS
    // =========================================================================

    /// Outbound broadcasts that could not be handed to the transport
    pub static ref BROADCAST_FAILURES: Counter = Counter::new(
        "guardian_processor_broadcast_failures_total",
        "Outbound gossip messages that could not be enqueued"
    ).expect("metric creation failed");

    /// Failed persistence writes of signed VAAs
    pub static ref PERSISTENCE_FAILURES: Counter = Counter::new(
        "guardian_processor_persistence_failures_total",
        "Signed VAAs that could not be persisted"
    ).expect("metric creation failed");

    /// Active guardian set index
    pub static ref GUARDIAN_SET_INDEX: Gauge = Gauge::new(
        "guardian_processor_guardian_set_index",
        "Index of the active guardian set"
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    registry: Arc<Registry>,
}

impl MetricsHandle {
    /// Registry the guardian metrics are registered in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Observations
        Box::new(OBSERVATIONS_RECEIVED.clone()),
        Box::new(OBSERVATIONS_FAILED.clone()),
        Box::new(MESSAGES_SIGNED.clone()),
        Box::new(VAA_INJECTIONS.clone()),
        Box::new(VAA_QUORUM.clone()),
        // Signed VAAs
        Box::new(SIGNED_VAA_RECEIVED.clone()),
        Box::new(SIGNED_VAA_FAILED.clone()),
        // Aggregation state
        Box::new(AGGREGATION_STATE_ENTRIES.clone()),
        Box::new(AGGREGATION_STATE_EXPIRED.clone()),
        Box::new(AGGREGATION_STATE_TIMEOUT.clone()),
        Box::new(AGGREGATION_STATE_UNOBSERVED.clone()),
        Box::new(AGGREGATION_STATE_LATE.clone()),
        Box::new(AGGREGATION_STATE_RETRIES.clone()),
        Box::new(AGGREGATION_STATE_FULFILLMENT.clone()),
        // Side effects
        Box::new(BROADCAST_FAILURES.clone()),
        Box::new(PERSISTENCE_FAILURES.clone()),
        Box::new(GUARDIAN_SET_INDEX.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_encode_contains_registered_metric() {
        let _handle = register_metrics().unwrap();
        VAA_INJECTIONS.inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("guardian_processor_vaa_injections_total"));
    }
}
