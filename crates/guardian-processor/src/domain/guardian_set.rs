//! Guardian set and its shared publication point
//!
//! A `GuardianSet` is immutable once built and replaced wholesale on
//! rotation. The event loop is the only writer of `GuardianSetState`; other
//! components read snapshots from it without blocking the loop.

use super::quorum::calculate_quorum;
use crate::error::{ProcessorError, ProcessorResult};
use arc_swap::ArcSwapOption;
use shared_crypto::Address;
use std::collections::HashSet;
use std::sync::Arc;

/// Largest guardian set whose full signature list fits a VAA (`u8` count).
pub const MAX_GUARDIAN_COUNT: usize = u8::MAX as usize;

/// Ordered guardian identities for one epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardianSet {
    keys: Vec<Address>,
    index: u32,
}

impl GuardianSet {
    /// Build a guardian set. Key order defines guardian indices.
    ///
    /// Each key may appear once, so no signature counts twice.
    pub fn new(keys: Vec<Address>, index: u32) -> ProcessorResult<Self> {
        if keys.len() > MAX_GUARDIAN_COUNT {
            return Err(ProcessorError::GuardianSetTooLarge {
                size: keys.len(),
                max: MAX_GUARDIAN_COUNT,
            });
        }

        let mut seen = HashSet::with_capacity(keys.len());
        if let Some(duplicate) = keys.iter().find(|key| !seen.insert(**key)) {
            return Err(ProcessorError::DuplicateGuardianKey {
                key: hex::encode(duplicate),
            });
        }

        Ok(Self { keys, index })
    }

    pub fn keys(&self) -> &[Address] {
        &self.keys
    }

    /// Epoch index of this set
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of `addr` in the set, if it is a member.
    pub fn key_index(&self, addr: &Address) -> Option<usize> {
        self.keys.iter().position(|k| k == addr)
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.key_index(addr).is_some()
    }

    /// Signatures required for quorum over this set.
    pub fn quorum(&self) -> usize {
        calculate_quorum(self.keys.len())
    }

    /// Hex-encoded keys, for logging.
    pub fn keys_as_hex(&self) -> Vec<String> {
        self.keys.iter().map(hex::encode).collect()
    }
}

/// Concurrently readable holder of the active guardian set.
///
/// Updates swap the whole `Arc`, so readers always see a complete set.
#[derive(Debug, Default)]
pub struct GuardianSetState {
    current: ArcSwapOption<GuardianSet>,
}

impl GuardianSetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new active set.
    pub fn set(&self, guardian_set: Arc<GuardianSet>) {
        self.current.store(Some(guardian_set));
    }

    /// Snapshot of the active set.
    pub fn get(&self) -> Option<Arc<GuardianSet>> {
        self.current.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        [n; 20]
    }

    #[test]
    fn test_key_index() {
        let set = GuardianSet::new(vec![addr(1), addr(2), addr(3)], 0).unwrap();

        assert_eq!(set.key_index(&addr(2)), Some(1));
        assert_eq!(set.key_index(&addr(9)), None);
        assert!(set.contains(&addr(3)));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_quorum_of_four() {
        let set = GuardianSet::new((1..=4).map(addr).collect(), 0).unwrap();
        assert_eq!(set.quorum(), 3);
    }

    #[test]
    fn test_too_large_rejected() {
        let keys = vec![addr(1); MAX_GUARDIAN_COUNT + 1];
        assert!(matches!(
            GuardianSet::new(keys, 0),
            Err(ProcessorError::GuardianSetTooLarge { .. })
        ));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = GuardianSet::new(vec![addr(1), addr(1), addr(2), addr(3)], 0);

        match result {
            Err(ProcessorError::DuplicateGuardianKey { key }) => {
                assert_eq!(key, hex::encode(addr(1)))
            }
            other => panic!("expected duplicate key error, got {:?}", other),
        }
    }

    #[test]
    fn test_state_publication() {
        let state = GuardianSetState::new();
        assert!(state.get().is_none());

        let first = Arc::new(GuardianSet::new(vec![addr(1)], 0).unwrap());
        state.set(first.clone());
        let snapshot = state.get().unwrap();

        state.set(Arc::new(GuardianSet::new(vec![addr(2)], 1).unwrap()));

        // A snapshot taken before the swap is unaffected by it
        assert_eq!(snapshot.index(), 0);
        assert_eq!(state.get().unwrap().index(), 1);
    }

    #[test]
    fn test_keys_as_hex() {
        let set = GuardianSet::new(vec![addr(0xab)], 0).unwrap();
        assert_eq!(set.keys_as_hex(), vec!["ab".repeat(20)]);
    }
}
