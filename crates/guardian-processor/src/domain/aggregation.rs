//! Per-digest aggregation state
//!
//! The table is owned exclusively by the event loop; nothing here is
//! synchronized.

use super::guardian_set::GuardianSet;
use super::vaa::{Digest, Vaa};
use shared_crypto::{Address, RecoverableSignature};
use std::collections::hash_map::{self, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Everything known locally about one digest.
#[derive(Clone, Debug)]
pub struct AggregationRecord {
    /// First local knowledge of the digest
    pub first_observed: Instant,
    /// Our unsigned candidate, present once we signed
    pub own_vaa: Option<Vaa>,
    /// Signatures by guardian address; later ones overwrite earlier ones
    pub signatures: HashMap<Address, RecoverableSignature>,
    /// Set once the quorum VAA was emitted or an authoritative one was seen
    pub submitted: bool,
    /// Set by cleanup after reconciliation
    pub settled: bool,
    /// Origin label for metrics
    pub source: String,
    /// Retransmissions attempted by cleanup
    pub retry_count: u32,
    /// Gossip bytes last broadcast for our own signature
    pub own_message: Option<Vec<u8>>,
    /// Guardian set in effect when we signed
    pub guardian_set: Option<Arc<GuardianSet>>,
}

impl AggregationRecord {
    pub fn new(now: Instant) -> Self {
        Self {
            first_observed: now,
            own_vaa: None,
            signatures: HashMap::new(),
            submitted: false,
            settled: false,
            source: String::new(),
            retry_count: 0,
            own_message: None,
            guardian_set: None,
        }
    }

    /// Whether this guardian observed the message itself.
    pub fn is_observed(&self) -> bool {
        self.own_vaa.is_some()
    }

    /// Record a guardian signature. Returns `true` if the guardian had not
    /// signed before.
    pub fn add_signature(&mut self, signer: Address, signature: RecoverableSignature) -> bool {
        self.signatures.insert(signer, signature).is_none()
    }

    /// Mark as submitted. Returns `true` on the first transition only.
    pub fn mark_submitted(&mut self) -> bool {
        !std::mem::replace(&mut self.submitted, true)
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.first_observed)
    }
}

/// Aggregation records keyed by digest.
#[derive(Debug, Default)]
pub struct AggregationTable {
    records: HashMap<Digest, AggregationRecord>,
}

impl AggregationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, digest: &Digest) -> Option<&AggregationRecord> {
        self.records.get(digest)
    }

    pub fn get_mut(&mut self, digest: &Digest) -> Option<&mut AggregationRecord> {
        self.records.get_mut(digest)
    }

    /// Fetch the record for `digest`, creating it with `now` as first sight.
    pub fn entry_or_insert(&mut self, digest: Digest, now: Instant) -> &mut AggregationRecord {
        self.records
            .entry(digest)
            .or_insert_with(|| AggregationRecord::new(now))
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.records.contains_key(digest)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Digest, AggregationRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> hash_map::IterMut<'_, Digest, AggregationRecord> {
        self.records.iter_mut()
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Digest, &mut AggregationRecord) -> bool,
    {
        self.records.retain(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(n: u8) -> RecoverableSignature {
        RecoverableSignature::from_bytes([n; 65])
    }

    #[test]
    fn test_entry_or_insert_keeps_first_sight() {
        let mut table = AggregationTable::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(5);

        table.entry_or_insert([1; 32], t0).add_signature([1; 20], sig(1));
        let record = table.entry_or_insert([1; 32], t1);

        assert_eq!(record.first_observed, t0);
        assert_eq!(record.signatures.len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_signature_overwrite() {
        let mut record = AggregationRecord::new(Instant::now());

        assert!(record.add_signature([1; 20], sig(1)));
        assert!(!record.add_signature([1; 20], sig(2)));

        assert_eq!(record.signatures.len(), 1);
        assert_eq!(record.signatures[&[1; 20]], sig(2));
    }

    #[test]
    fn test_submitted_is_monotone() {
        let mut record = AggregationRecord::new(Instant::now());

        assert!(record.mark_submitted());
        assert!(!record.mark_submitted());
        assert!(record.submitted);
    }

    #[test]
    fn test_age() {
        let t0 = Instant::now();
        let record = AggregationRecord::new(t0);

        assert_eq!(record.age(t0 + Duration::from_secs(31)), Duration::from_secs(31));
        // Clock before first sight saturates to zero
        assert_eq!(record.age(t0 - Duration::from_millis(1)), Duration::ZERO);
    }

    #[test]
    fn test_retain() {
        let mut table = AggregationTable::new();
        let now = Instant::now();
        table.entry_or_insert([1; 32], now).settled = true;
        table.entry_or_insert([2; 32], now);

        table.retain(|_, record| !record.settled);

        assert!(!table.contains(&[1; 32]));
        assert!(table.contains(&[2; 32]));
    }
}
