//! Random duty selection.

use crate::types::OperatorId;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// Picks `count` distinct operators out of a candidate set.
///
/// Implementations must return `min(count, candidates.len())` members of
/// `candidates`, each subset equally likely. Tests substitute deterministic
/// implementations to assert exact membership.
pub trait RandomSelector: Send + Sync {
    fn select(&self, candidates: &BTreeSet<OperatorId>, count: usize) -> BTreeSet<OperatorId>;
}

fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    candidates: &BTreeSet<OperatorId>,
    count: usize,
) -> BTreeSet<OperatorId> {
    candidates
        .iter()
        .copied()
        .choose_multiple(rng, count)
        .into_iter()
        .collect()
}

/// Uniform selection backed by the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSelector;

impl RandomSelector for UniformSelector {
    fn select(&self, candidates: &BTreeSet<OperatorId>, count: usize) -> BTreeSet<OperatorId> {
        sample(&mut rand::thread_rng(), candidates, count)
    }
}

/// Uniform selection from a seeded RNG, reproducible across runs
pub struct SeededSelector {
    rng: Mutex<StdRng>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSelector for SeededSelector {
    fn select(&self, candidates: &BTreeSet<OperatorId>, count: usize) -> BTreeSet<OperatorId> {
        let mut rng = self.rng.lock();
        sample(&mut *rng, candidates, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pool(ids: &[OperatorId]) -> BTreeSet<OperatorId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_select_is_subset_of_requested_size() {
        let candidates = pool(&[1, 2, 3, 4, 5]);
        for _ in 0..100 {
            let picked = UniformSelector.select(&candidates, 2);
            assert_eq!(picked.len(), 2);
            assert!(picked.is_subset(&candidates));
        }
    }

    #[test]
    fn test_select_caps_at_candidate_count() {
        let candidates = pool(&[7]);
        assert_eq!(UniformSelector.select(&candidates, 2), pool(&[7]));
        assert!(UniformSelector.select(&BTreeSet::new(), 2).is_empty());
    }

    #[test]
    fn test_seeded_selector_is_reproducible() {
        let candidates = pool(&[10, 20, 30, 40, 50, 60]);
        let a = SeededSelector::new(99);
        let b = SeededSelector::new(99);

        for _ in 0..20 {
            assert_eq!(a.select(&candidates, 2), b.select(&candidates, 2));
        }
    }

    #[test]
    fn test_uniform_selector_reaches_every_pair() {
        let candidates = pool(&[1, 2, 3, 4]);
        let selector = SeededSelector::new(7);
        let mut seen: HashMap<Vec<OperatorId>, usize> = HashMap::new();

        for _ in 0..2000 {
            let picked: Vec<_> = selector.select(&candidates, 2).into_iter().collect();
            *seen.entry(picked).or_default() += 1;
        }

        // C(4, 2) = 6 pairs, each expected ~333 times
        assert_eq!(seen.len(), 6);
        assert!(seen.values().all(|&n| n > 200));
    }
}
