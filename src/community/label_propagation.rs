use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::{CommunityAlgorithm, CommunityStrategy};
use crate::graph::Graph;

const WEIGHT_EPSILON: f64 = 1e-12;

/// Asynchronous weighted label propagation.
///
/// Visit order and tie-breaking are randomized from `seed`, so two runs agree
/// only when they share a seed.
#[derive(Clone, Copy, Debug)]
pub struct LabelPropagation {
    seed: u64,
    max_iterations: usize,
}

impl LabelPropagation {
    pub fn new(seed: u64, max_iterations: usize) -> Self {
        Self {
            seed,
            max_iterations,
        }
    }
}

impl CommunityStrategy for LabelPropagation {
    fn algorithm(&self) -> CommunityAlgorithm {
        CommunityAlgorithm::LabelPropagation
    }

    fn deterministic(&self) -> bool {
        false
    }

    fn assign(&self, graph: &Graph) -> Vec<usize> {
        let n = graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut tally: BTreeMap<usize, f64> = BTreeMap::new();
        let mut candidates = Vec::new();

        for _ in 0..self.max_iterations {
            order.shuffle(&mut rng);
            let mut changed = false;
            for &v in &order {
                let neighbors = graph.neighbors(v);
                if neighbors.is_empty() {
                    continue;
                }
                tally.clear();
                for nb in neighbors {
                    *tally.entry(labels[nb.index]).or_default() += nb.weight;
                }
                let best = tally.values().copied().fold(f64::MIN, f64::max);
                candidates.clear();
                candidates.extend(
                    tally
                        .iter()
                        .filter(|(_, w)| **w >= best - WEIGHT_EPSILON)
                        .map(|(label, _)| *label),
                );
                if candidates.contains(&labels[v]) {
                    continue;
                }
                let pick = candidates[rng.gen_range(0..candidates.len())];
                labels[v] = pick;
                changed = true;
            }
            if !changed {
                break;
            }
        }
        labels
    }
}
