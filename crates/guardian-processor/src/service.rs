//! Aggregation Service - core business logic
//!
//! Owned and driven by the event loop in `processor`. Every handler runs to
//! completion before the next event is taken, so the aggregation table and
//! the active guardian set need no locking.

use crate::config::ProcessorConfig;
use crate::domain::{
    assemble_vaa, evaluate_quorum, AggregationRecord, AggregationTable, Digest, GuardianSet,
    GuardianSetState, Vaa,
};
use crate::error::{ProcessorError, ProcessorResult};
use crate::events::{
    GossipMessage, MessagePublication, MessagePublicationEvent, MissingSignaturesAlert,
    SettlementEvent, SettlementOutcome, SignedObservation, SignedVaaWithQuorum, VaaQuorumEvent,
};
use crate::metrics;
use crate::ports::outbound::{
    AttestationReporter, AttestationStore, Broadcaster, GuardianSigner, Notifier,
    SignatureVerifier,
};
use shared_crypto::{Address, RecoverableSignature};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Outbound collaborators of the processor.
#[derive(Clone)]
pub struct ProcessorDependencies {
    pub broadcaster: Arc<dyn Broadcaster>,
    pub store: Arc<dyn AttestationStore>,
    pub reporter: Arc<dyn AttestationReporter>,
    pub notifier: Arc<dyn Notifier>,
    pub signer: Arc<dyn GuardianSigner>,
    pub verifier: Arc<dyn SignatureVerifier>,
}

/// Counters for one cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub settled: usize,
    pub missed: usize,
    pub retransmitted: usize,
    pub expired: usize,
    pub remaining: usize,
}

/// Signature aggregation state machine
pub struct ProcessorService {
    config: ProcessorConfig,
    deps: ProcessorDependencies,
    our_addr: Address,
    /// Active guardian set
    guardian_set: Option<Arc<GuardianSet>>,
    /// Recent guardian sets by index, for verifying finished VAAs
    guardian_set_history: BTreeMap<u32, Arc<GuardianSet>>,
    guardian_set_state: Arc<GuardianSetState>,
    state: AggregationTable,
}

impl ProcessorService {
    pub fn new(
        config: ProcessorConfig,
        deps: ProcessorDependencies,
        guardian_set_state: Arc<GuardianSetState>,
    ) -> Self {
        let our_addr = deps.signer.address();
        Self {
            config,
            deps,
            our_addr,
            guardian_set: None,
            guardian_set_history: BTreeMap::new(),
            guardian_set_state,
            state: AggregationTable::new(),
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// This guardian's address
    pub fn our_address(&self) -> Address {
        self.our_addr
    }

    pub fn guardian_set(&self) -> Option<&Arc<GuardianSet>> {
        self.guardian_set.as_ref()
    }

    /// Guardian set with `index`, if still held in history.
    pub fn known_guardian_set(&self, index: u32) -> Option<&Arc<GuardianSet>> {
        self.guardian_set_history.get(&index)
    }

    pub fn state(&self) -> &AggregationTable {
        &self.state
    }

    // =========================================================================
    // GUARDIAN SET
    // =========================================================================

    /// Activate a new guardian set.
    ///
    /// Collected signatures are not re-validated; quorum is always evaluated
    /// against whichever set is active at evaluation time.
    pub fn handle_guardian_set_update(&mut self, guardian_set: GuardianSet) {
        if let Some(current) = &self.guardian_set {
            if guardian_set.index() <= current.index() {
                warn!(
                    current = current.index(),
                    received = guardian_set.index(),
                    "[processor] ignoring stale guardian set update"
                );
                return;
            }
        }

        let guardian_set = Arc::new(guardian_set);
        info!(
            index = guardian_set.index(),
            keys = ?guardian_set.keys_as_hex(),
            "guardian set updated"
        );

        self.guardian_set_history
            .insert(guardian_set.index(), Arc::clone(&guardian_set));
        while self.guardian_set_history.len() > self.config.guardian_set_history {
            self.guardian_set_history.pop_first();
        }

        metrics::set_guardian_set_index(guardian_set.index());
        self.guardian_set_state.set(Arc::clone(&guardian_set));
        self.guardian_set = Some(guardian_set);
    }

    // =========================================================================
    // LOCAL OBSERVATIONS
    // =========================================================================

    /// Sign and broadcast a message observed by our own watchers.
    pub async fn handle_message_publication(
        &mut self,
        publication: MessagePublication,
        now: Instant,
    ) -> ProcessorResult<()> {
        let guardian_set = self
            .guardian_set
            .clone()
            .ok_or(ProcessorError::NoGuardianSet)?;

        let vaa = publication.to_unsigned_vaa(guardian_set.index());
        debug!(
            message_id = %publication.message_id(),
            tx_hash = %hex::encode(publication.tx_hash),
            digest = %hex::encode(vaa.digest()),
            "[processor] message publication confirmed"
        );

        let emitter_chain = vaa.emitter_chain.to_string();
        if self
            .sign_observation(vaa, publication.tx_hash.to_vec(), guardian_set, now)
            .await?
        {
            metrics::record_message_signed(&emitter_chain);
        }
        Ok(())
    }

    /// Sign a pre-built VAA handed to us locally.
    pub async fn handle_injection(&mut self, vaa: Vaa, now: Instant) -> ProcessorResult<()> {
        let guardian_set = self
            .guardian_set
            .clone()
            .ok_or(ProcessorError::NoGuardianSet)?;

        info!(
            message_id = %vaa.message_id(),
            digest = %hex::encode(vaa.digest()),
            "[processor] signing injected VAA"
        );

        if self
            .sign_observation(vaa, Vec::new(), guardian_set, now)
            .await?
        {
            metrics::record_vaa_injection();
        }
        Ok(())
    }

    /// Returns `false` if we had already signed this digest.
    async fn sign_observation(
        &mut self,
        vaa: Vaa,
        tx_hash: Vec<u8>,
        guardian_set: Arc<GuardianSet>,
        now: Instant,
    ) -> ProcessorResult<bool> {
        let digest = vaa.digest();

        if self.state.get(&digest).is_some_and(AggregationRecord::is_observed) {
            trace!(digest = %hex::encode(digest), "[processor] already signed");
            return Ok(false);
        }

        // Nothing is recorded until signing and encoding succeed
        let signature = self.deps.signer.sign(&digest)?;
        let message = observation_message(self.our_addr, digest, &signature, tx_hash, &vaa)?;

        broadcast(self.deps.broadcaster.as_ref(), message.clone());

        let event = MessagePublicationEvent {
            digest,
            message_id: vaa.message_id(),
            emitter_chain: vaa.emitter_chain,
            guardian_set_index: guardian_set.index(),
        };

        let record = self.state.entry_or_insert(digest, now);
        if record.settled {
            metrics::record_state_late();
        }
        record.add_signature(self.our_addr, signature);
        record.source = vaa.emitter_chain.to_string();
        record.own_vaa = Some(vaa);
        record.own_message = Some(message);
        record.guardian_set = Some(guardian_set);

        self.deps.reporter.report_message_publication(event);

        self.try_submit(&digest).await;
        Ok(true)
    }

    // =========================================================================
    // REMOTE INPUT
    // =========================================================================

    /// Record a peer's signature over a digest.
    ///
    /// The signer is recovered from the signature itself; a claimed address
    /// that does not match, or a signer outside every known guardian set, is
    /// dropped without touching the table.
    pub async fn handle_signed_observation(
        &mut self,
        observation: SignedObservation,
        now: Instant,
    ) -> ProcessorResult<()> {
        metrics::record_observation_received();

        let invalid = || ProcessorError::InvalidObservationSignature {
            guardian: hex::encode(observation.addr),
        };

        let signature = RecoverableSignature::from_slice(&observation.signature).map_err(|_| {
            metrics::record_observation_failed("invalid_signature");
            invalid()
        })?;

        let recovered = self
            .deps
            .verifier
            .recover(&observation.hash, &signature)
            .ok_or_else(|| {
                metrics::record_observation_failed("invalid_signature");
                invalid()
            })?;

        if recovered != observation.addr {
            metrics::record_observation_failed("signer_mismatch");
            return Err(ProcessorError::signer_mismatch(&observation.addr, &recovered));
        }

        // Members of any set still held in history, current or previous
        if !self
            .guardian_set_history
            .values()
            .any(|set| set.contains(&recovered))
        {
            metrics::record_observation_failed("unknown_guardian");
            return Err(ProcessorError::UnknownGuardian {
                guardian: hex::encode(recovered),
            });
        }

        debug!(
            digest = %hex::encode(observation.hash),
            signer = %hex::encode(observation.addr),
            message_id = %observation.message_id,
            "[processor] received observation"
        );

        let record = self.state.entry_or_insert(observation.hash, now);
        if record.settled {
            metrics::record_state_late();
        }
        record.add_signature(observation.addr, signature);

        self.try_submit(&observation.hash).await;
        Ok(())
    }

    /// Accept a finished VAA from the network.
    ///
    /// Verified against the guardian set it quotes. Marks a matching record
    /// submitted and persists it once; never re-broadcast.
    pub async fn handle_signed_vaa_with_quorum(
        &mut self,
        message: SignedVaaWithQuorum,
    ) -> ProcessorResult<()> {
        metrics::record_signed_vaa_received();

        let vaa = Vaa::unmarshal(&message.vaa).inspect_err(|_| {
            metrics::record_signed_vaa_failed("decode");
        })?;

        let guardian_set = self
            .guardian_set_history
            .get(&vaa.guardian_set_index)
            .ok_or_else(|| {
                metrics::record_signed_vaa_failed("unknown_guardian_set");
                ProcessorError::UnknownGuardianSet {
                    index: vaa.guardian_set_index,
                }
            })?;

        vaa.verify_signatures(guardian_set).inspect_err(|e| {
            let reason = match e {
                ProcessorError::InsufficientSignatures { .. } => "no_quorum",
                _ => "invalid_signatures",
            };
            metrics::record_signed_vaa_failed(reason);
        })?;

        let digest = vaa.digest();
        if let Some(record) = self.state.get_mut(&digest) {
            if record.mark_submitted() {
                debug!(digest = %hex::encode(digest), "[processor] quorum VAA received from peer");
            }
        }

        match self.deps.store.has_signed_vaa(&digest).await {
            Ok(true) => {
                trace!(digest = %hex::encode(digest), "[processor] VAA already stored");
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "[processor] store lookup failed, storing anyway"),
        }

        info!(
            message_id = %vaa.message_id(),
            digest = %hex::encode(digest),
            signatures = vaa.signatures.len(),
            "[processor] storing VAA with quorum from peer"
        );
        self.persist(&vaa).await;
        Ok(())
    }

    // =========================================================================
    // QUORUM
    // =========================================================================

    /// Submit the record's VAA if it has quorum under the active set.
    async fn try_submit(&mut self, digest: &Digest) {
        let Some(guardian_set) = self.guardian_set.clone() else {
            return;
        };
        let Some(record) = self.state.get_mut(digest) else {
            return;
        };
        if record.submitted {
            return;
        }

        if let Some(snapshot) = &record.guardian_set {
            if snapshot.index() != guardian_set.index() {
                debug!(
                    digest = %hex::encode(digest),
                    signed_under = snapshot.index(),
                    active = guardian_set.index(),
                    "[processor] guardian set changed since observation"
                );
            }
        }

        let evaluation = evaluate_quorum(&guardian_set, &record.signatures);
        if !evaluation.has_quorum() {
            trace!(
                digest = %hex::encode(digest),
                have = evaluation.count(),
                need = evaluation.required,
                "[processor] no quorum yet"
            );
            return;
        }

        let Some(own_vaa) = &record.own_vaa else {
            debug!(
                digest = %hex::encode(digest),
                signatures = evaluation.count(),
                "[processor] peers reached quorum on a message we did not observe"
            );
            return;
        };

        let vaa = assemble_vaa(own_vaa, evaluation);
        let bytes = match vaa.marshal() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(digest = %hex::encode(digest), error = %e, "[processor] failed to marshal VAA");
                return;
            }
        };
        record.mark_submitted();

        info!(
            message_id = %vaa.message_id(),
            digest = %hex::encode(digest),
            signatures = vaa.signatures.len(),
            guardian_set_index = vaa.guardian_set_index,
            "signature quorum reached, submitting VAA"
        );
        metrics::record_vaa_quorum(&vaa.emitter_chain.to_string());

        match GossipMessage::SignedVaaWithQuorum(SignedVaaWithQuorum { vaa: bytes.clone() })
            .encode()
        {
            Ok(message) => broadcast(self.deps.broadcaster.as_ref(), message),
            Err(e) => error!(error = %e, "[processor] failed to encode quorum VAA"),
        }

        self.persist(&vaa).await;

        self.deps.reporter.report_vaa_quorum(VaaQuorumEvent {
            digest: *digest,
            message_id: vaa.message_id(),
            guardian_set_index: vaa.guardian_set_index,
            signature_count: vaa.signatures.len(),
            vaa: bytes,
        });
    }

    async fn persist(&self, vaa: &Vaa) {
        if let Err(e) = self.deps.store.store_signed_vaa(vaa).await {
            metrics::record_persistence_failure();
            error!(
                message_id = %vaa.message_id(),
                error = %e,
                "[processor] failed to persist signed VAA"
            );
        }
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    /// Settle, retransmit and evict aggregation records.
    pub fn handle_cleanup(&mut self, now: Instant) -> CleanupSummary {
        let mut summary = CleanupSummary::default();
        let config = &self.config;
        let deps = &self.deps;
        let active = self.guardian_set.as_ref();
        let our_addr = self.our_addr;

        for (digest, record) in self.state.iter_mut() {
            if record.settled || record.age(now) <= config.settlement_timeout {
                continue;
            }

            if record.submitted {
                settle(deps, active, digest, record, SettlementOutcome::Submitted);
                summary.settled += 1;
                continue;
            }

            record.retry_count += 1;
            let ceiling = if record.is_observed() {
                config.max_own_retries
            } else {
                config.max_unobserved_retries
            };

            if record.retry_count > ceiling {
                settle(deps, active, digest, record, SettlementOutcome::Missed);
                summary.missed += 1;
                continue;
            }

            if let Some(message) = retransmission(our_addr, digest, record) {
                debug!(
                    digest = %hex::encode(digest),
                    retry = record.retry_count,
                    "[processor] resubmitting observation"
                );
                metrics::record_retry();
                broadcast(deps.broadcaster.as_ref(), message);
                summary.retransmitted += 1;
            }
        }

        let retention = config.retention_window;
        let before = self.state.len();
        self.state
            .retain(|_, record| !(record.settled && record.age(now) >= retention));
        summary.expired = before - self.state.len();
        for _ in 0..summary.expired {
            metrics::record_state_expired();
        }

        summary.remaining = self.state.len();
        metrics::set_aggregation_entries(summary.remaining);

        info!(
            settled = summary.settled,
            missed = summary.missed,
            retransmitted = summary.retransmitted,
            expired = summary.expired,
            remaining = summary.remaining,
            "[processor] aggregation state cleanup"
        );
        summary
    }
}

/// Gossip bytes carrying our signature for `vaa`.
fn observation_message(
    our_addr: Address,
    digest: Digest,
    signature: &RecoverableSignature,
    tx_hash: Vec<u8>,
    vaa: &Vaa,
) -> ProcessorResult<Vec<u8>> {
    GossipMessage::SignedObservation(SignedObservation {
        addr: our_addr,
        hash: digest,
        signature: signature.as_bytes().to_vec(),
        tx_hash,
        message_id: vaa.message_id(),
    })
    .encode()
}

/// Message to re-broadcast for a record, rebuilding it from our signature
/// if the original bytes are gone. Unobserved records have nothing to send.
fn retransmission(our_addr: Address, digest: &Digest, record: &mut AggregationRecord) -> Option<Vec<u8>> {
    if let Some(message) = &record.own_message {
        return Some(message.clone());
    }

    let vaa = record.own_vaa.as_ref()?;
    let signature = record.signatures.get(&our_addr)?;
    match observation_message(our_addr, *digest, signature, Vec::new(), vaa) {
        Ok(message) => {
            record.own_message = Some(message.clone());
            Some(message)
        }
        Err(e) => {
            error!(error = %e, "[processor] failed to rebuild observation message");
            None
        }
    }
}

fn broadcast(broadcaster: &dyn Broadcaster, message: Vec<u8>) {
    if let Err(e) = broadcaster.broadcast(message) {
        metrics::record_broadcast_failure();
        warn!(error = %e, "[processor] broadcast failed");
    }
}

/// Reconcile a record against the guardian set it was signed under.
fn settle(
    deps: &ProcessorDependencies,
    active: Option<&Arc<GuardianSet>>,
    digest: &Digest,
    record: &mut AggregationRecord,
    outcome: SettlementOutcome,
) {
    record.settled = true;

    let origin = if record.source.is_empty() {
        "unknown"
    } else {
        record.source.as_str()
    };
    let guardian_set = record.guardian_set.as_ref().or(active);

    let (signers, missing): (Vec<Address>, Vec<Address>) = match guardian_set {
        Some(set) => set
            .keys()
            .iter()
            .copied()
            .partition(|key| record.signatures.contains_key(key)),
        None => (record.signatures.keys().copied().collect(), Vec::new()),
    };

    for key in &signers {
        metrics::record_fulfillment(&hex::encode(key), origin, true);
    }
    for key in &missing {
        metrics::record_fulfillment(&hex::encode(key), origin, false);
    }

    let observed = record.is_observed();
    if outcome == SettlementOutcome::Missed {
        if observed {
            metrics::record_state_timeout();
        } else {
            metrics::record_state_unobserved();
        }
    }

    let missing_hex: Vec<String> = missing.iter().map(hex::encode).collect();
    info!(
        digest = %hex::encode(digest),
        origin,
        ?outcome,
        observed,
        signed = signers.len(),
        missing = ?missing_hex,
        retries = record.retry_count,
        "[processor] aggregation state settled"
    );

    if outcome == SettlementOutcome::Missed {
        if let (Some(vaa), Some(set)) = (&record.own_vaa, guardian_set) {
            let alert = MissingSignaturesAlert {
                digest: *digest,
                message_id: vaa.message_id(),
                source: origin.to_string(),
                guardian_set_index: set.index(),
                signed: signers.len(),
                required: set.quorum(),
                missing: missing.clone(),
            };
            if let Err(e) = deps.notifier.missing_signatures(&alert) {
                warn!(error = %e, "[processor] failed to send missing signatures alert");
            }
        }
    }

    deps.reporter.report_settlement(SettlementEvent {
        digest: *digest,
        source: origin.to_string(),
        outcome,
        observed,
        signers,
        missing,
    });
}
