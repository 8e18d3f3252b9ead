//! Quorum evaluation and VAA assembly
//!
//! Quorum is a supermajority of the guardian set: strictly more than two
//! thirds of its members. The threshold is a consensus parameter and must
//! not be tuned.

use super::guardian_set::GuardianSet;
use super::vaa::{Vaa, VaaSignature};
use shared_crypto::{Address, RecoverableSignature};
use std::collections::HashMap;

/// Number of signatures required for quorum over `num_guardians`.
///
/// Equals `⌈(2n + 1) / 3⌉`; exactly two thirds is never enough.
pub fn calculate_quorum(num_guardians: usize) -> usize {
    ((num_guardians * 10 / 3) * 2) / 10 + 1
}

/// Signatures of one guardian set's members over a digest.
#[derive(Clone, Debug)]
pub struct QuorumEvaluation {
    /// Member signatures ordered by guardian index
    pub signatures: Vec<VaaSignature>,
    /// Signatures required for quorum
    pub required: usize,
    /// Index of the evaluated guardian set
    pub guardian_set_index: u32,
}

impl QuorumEvaluation {
    pub fn has_quorum(&self) -> bool {
        self.signatures.len() >= self.required
    }

    pub fn count(&self) -> usize {
        self.signatures.len()
    }
}

/// Collect the signatures of `guardian_set` members, ordered by index.
///
/// Signatures from non-members are ignored but not discarded by the caller.
pub fn evaluate_quorum(
    guardian_set: &GuardianSet,
    signatures: &HashMap<Address, RecoverableSignature>,
) -> QuorumEvaluation {
    let signatures = guardian_set
        .keys()
        .iter()
        .enumerate()
        .filter_map(|(index, key)| {
            let signature = signatures.get(key)?;
            // GuardianSet::new bounds indices to u8
            let index = u8::try_from(index).ok()?;
            Some(VaaSignature {
                index,
                signature: *signature,
            })
        })
        .collect();

    QuorumEvaluation {
        signatures,
        required: guardian_set.quorum(),
        guardian_set_index: guardian_set.index(),
    }
}

/// Whether `signatures` reach quorum over `guardian_set`.
pub fn has_quorum(
    guardian_set: &GuardianSet,
    signatures: &HashMap<Address, RecoverableSignature>,
) -> bool {
    evaluate_quorum(guardian_set, signatures).has_quorum()
}

/// Build the multi-signed VAA from our unsigned candidate.
pub fn assemble_vaa(unsigned: &Vaa, evaluation: QuorumEvaluation) -> Vaa {
    let mut vaa = unsigned.clone();
    vaa.guardian_set_index = evaluation.guardian_set_index;
    vaa.signatures = evaluation.signatures;
    vaa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChainId;
    use proptest::prelude::*;

    fn addr(n: u8) -> Address {
        [n; 20]
    }

    fn sig(n: u8) -> RecoverableSignature {
        RecoverableSignature::from_bytes([n; 65])
    }

    fn set_of(members: &[u8], index: u32) -> GuardianSet {
        GuardianSet::new(members.iter().copied().map(addr).collect(), index).unwrap()
    }

    #[test]
    fn test_quorum_table() {
        assert_eq!(calculate_quorum(0), 1);
        assert_eq!(calculate_quorum(1), 1);
        assert_eq!(calculate_quorum(2), 2);
        assert_eq!(calculate_quorum(3), 3);
        assert_eq!(calculate_quorum(4), 3);
        assert_eq!(calculate_quorum(6), 5);
        assert_eq!(calculate_quorum(19), 13);
    }

    #[test]
    fn test_exact_two_thirds_is_not_quorum() {
        // 4 of 6 is exactly two thirds
        let set = set_of(&[1, 2, 3, 4, 5, 6], 0);
        let sigs: HashMap<_, _> = (1..=4).map(|n| (addr(n), sig(n))).collect();
        assert!(!has_quorum(&set, &sigs));

        let sigs: HashMap<_, _> = (1..=5).map(|n| (addr(n), sig(n))).collect();
        assert!(has_quorum(&set, &sigs));
    }

    #[test]
    fn test_non_members_are_not_counted() {
        let set = set_of(&[1, 2, 3, 4], 0);
        let sigs: HashMap<_, _> = [1, 2, 7, 8, 9].iter().map(|&n| (addr(n), sig(n))).collect();

        let evaluation = evaluate_quorum(&set, &sigs);
        assert_eq!(evaluation.count(), 2);
        assert!(!evaluation.has_quorum());
    }

    #[test]
    fn test_signatures_ordered_by_index() {
        let set = set_of(&[4, 3, 2, 1], 7);
        let sigs: HashMap<_, _> = [1, 2, 4].iter().map(|&n| (addr(n), sig(n))).collect();

        let evaluation = evaluate_quorum(&set, &sigs);
        let indices: Vec<u8> = evaluation.signatures.iter().map(|s| s.index).collect();

        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(evaluation.signatures[0].signature, sig(4));
        assert_eq!(evaluation.guardian_set_index, 7);
    }

    #[test]
    fn test_assemble_stamps_set_index() {
        let unsigned = Vaa {
            version: 1,
            guardian_set_index: 0,
            signatures: Vec::new(),
            timestamp: 1_650_000_000,
            nonce: 7,
            emitter_chain: ChainId::ETHEREUM,
            emitter_address: [9; 32],
            sequence: 42,
            consistency_level: 15,
            payload: b"p".to_vec(),
        };
        let set = set_of(&[1, 2, 3], 5);
        let sigs: HashMap<_, _> = (1..=3).map(|n| (addr(n), sig(n))).collect();

        let vaa = assemble_vaa(&unsigned, evaluate_quorum(&set, &sigs));

        assert_eq!(vaa.guardian_set_index, 5);
        assert_eq!(vaa.signatures.len(), 3);
        assert_eq!(vaa.digest(), unsigned.digest());
    }

    #[test]
    fn test_rotation_membership() {
        // A, B, C signed under the old set; the new set replaces C with E
        let old_set = set_of(&[1, 2, 3, 4], 0);
        let new_set = set_of(&[1, 2, 5, 4], 1);
        let sigs: HashMap<_, _> = (1..=3).map(|n| (addr(n), sig(n))).collect();

        assert!(has_quorum(&old_set, &sigs));
        assert!(!has_quorum(&new_set, &sigs));
    }

    proptest! {
        #[test]
        fn prop_quorum_is_strict_supermajority(n in 0usize..=256) {
            let q = calculate_quorum(n);
            // ceil((2n + 1) / 3)
            prop_assert_eq!(q, (2 * n + 1 + 2) / 3);
            // q signatures are strictly more than two thirds...
            prop_assert!(3 * q > 2 * n);
            // ...and q - 1 are not
            prop_assert!(3 * (q - 1) <= 2 * n);
        }

        #[test]
        fn prop_quorum_iff_more_than_two_thirds(n in 1usize..=32, signed in 0usize..=32) {
            let signed = signed.min(n);
            let set = GuardianSet::new((0..n).map(|i| [i as u8; 20]).collect(), 0).unwrap();
            let sigs: HashMap<_, _> = (0..signed).map(|i| ([i as u8; 20], sig(i as u8))).collect();

            prop_assert_eq!(has_quorum(&set, &sigs), 3 * signed > 2 * n);
        }
    }
}
