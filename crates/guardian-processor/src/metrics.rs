//! # Processor Metrics
//!
//! Thin recording functions over the statics in `guardian_telemetry::metrics`.
//!
//! ## Usage
//!
//! Enabled by the default `metrics` feature:
//! ```toml
//! guardian-processor = { path = "...", default-features = false }  # no-op metrics
//! ```

#[cfg(feature = "metrics")]
use guardian_telemetry::metrics::{
    AGGREGATION_STATE_ENTRIES, AGGREGATION_STATE_EXPIRED, AGGREGATION_STATE_FULFILLMENT,
    AGGREGATION_STATE_LATE, AGGREGATION_STATE_RETRIES, AGGREGATION_STATE_TIMEOUT,
    AGGREGATION_STATE_UNOBSERVED, BROADCAST_FAILURES, GUARDIAN_SET_INDEX, MESSAGES_SIGNED,
    OBSERVATIONS_FAILED, OBSERVATIONS_RECEIVED, PERSISTENCE_FAILURES, SIGNED_VAA_FAILED,
    SIGNED_VAA_RECEIVED, VAA_INJECTIONS, VAA_QUORUM,
};

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a signed observation received from gossip
#[cfg(feature = "metrics")]
pub fn record_observation_received() {
    OBSERVATIONS_RECEIVED.inc();
}

/// Record a dropped signed observation
#[cfg(feature = "metrics")]
pub fn record_observation_failed(reason: &str) {
    OBSERVATIONS_FAILED.with_label_values(&[reason]).inc();
}

/// Record a local observation we signed
#[cfg(feature = "metrics")]
pub fn record_message_signed(emitter_chain: &str) {
    MESSAGES_SIGNED.with_label_values(&[emitter_chain]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_vaa_injection() {
    VAA_INJECTIONS.inc();
}

/// Record a VAA submitted after reaching quorum
#[cfg(feature = "metrics")]
pub fn record_vaa_quorum(emitter_chain: &str) {
    VAA_QUORUM.with_label_values(&[emitter_chain]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_signed_vaa_received() {
    SIGNED_VAA_RECEIVED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_signed_vaa_failed(reason: &str) {
    SIGNED_VAA_FAILED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_aggregation_entries(entries: usize) {
    AGGREGATION_STATE_ENTRIES.set(i64::try_from(entries).unwrap_or(i64::MAX));
}

#[cfg(feature = "metrics")]
pub fn record_state_expired() {
    AGGREGATION_STATE_EXPIRED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_state_timeout() {
    AGGREGATION_STATE_TIMEOUT.inc();
}

#[cfg(feature = "metrics")]
pub fn record_state_unobserved() {
    AGGREGATION_STATE_UNOBSERVED.inc();
}

/// Record a signature for an already settled record
#[cfg(feature = "metrics")]
pub fn record_state_late() {
    AGGREGATION_STATE_LATE.inc();
}

#[cfg(feature = "metrics")]
pub fn record_retry() {
    AGGREGATION_STATE_RETRIES.inc();
}

/// Record one guardian's presence at settlement
#[cfg(feature = "metrics")]
pub fn record_fulfillment(addr: &str, origin: &str, present: bool) {
    let status = if present { "present" } else { "missing" };
    AGGREGATION_STATE_FULFILLMENT
        .with_label_values(&[addr, origin, status])
        .inc();
}

#[cfg(feature = "metrics")]
pub fn record_broadcast_failure() {
    BROADCAST_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_persistence_failure() {
    PERSISTENCE_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn set_guardian_set_index(index: u32) {
    GUARDIAN_SET_INDEX.set(index as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_observation_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_observation_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_message_signed(_emitter_chain: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_vaa_injection() {}

#[cfg(not(feature = "metrics"))]
pub fn record_vaa_quorum(_emitter_chain: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_signed_vaa_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_signed_vaa_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_aggregation_entries(_entries: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_state_expired() {}

#[cfg(not(feature = "metrics"))]
pub fn record_state_timeout() {}

#[cfg(not(feature = "metrics"))]
pub fn record_state_unobserved() {}

#[cfg(not(feature = "metrics"))]
pub fn record_state_late() {}

#[cfg(not(feature = "metrics"))]
pub fn record_retry() {}

#[cfg(not(feature = "metrics"))]
pub fn record_fulfillment(_addr: &str, _origin: &str, _present: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_broadcast_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_persistence_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn set_guardian_set_index(_index: u32) {}
