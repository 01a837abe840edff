use std::collections::BTreeMap;

use super::{CommunityAlgorithm, CommunityStrategy};
use crate::graph::Graph;

const MIN_GAIN: f64 = 1e-12;

/// Agglomerative modularity maximization.
///
/// Starts from singletons and repeatedly merges the connected pair of
/// communities with the largest modularity gain until no merge improves
/// modularity. Ties go to the lowest community pair, so the result depends
/// only on the graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyModularity;

impl CommunityStrategy for GreedyModularity {
    fn algorithm(&self) -> CommunityAlgorithm {
        CommunityAlgorithm::GreedyModularity
    }

    fn assign(&self, graph: &Graph) -> Vec<usize> {
        let n = graph.node_count();
        let mut labels: Vec<usize> = (0..n).collect();
        let two_m: f64 = (0..n).map(|v| graph.strength(v)).sum();
        if two_m <= 0.0 {
            return labels;
        }

        // e[i][j]: fraction of edge ends joining communities i and j.
        let mut e: Vec<BTreeMap<usize, f64>> = (0..n)
            .map(|v| {
                graph
                    .neighbors(v)
                    .iter()
                    .map(|nb| (nb.index, nb.weight / two_m))
                    .collect()
            })
            .collect();
        let mut a: Vec<f64> = (0..n).map(|v| graph.strength(v) / two_m).collect();
        let mut members: Vec<Vec<usize>> = (0..n).map(|v| vec![v]).collect();

        loop {
            let mut best: Option<(f64, usize, usize)> = None;
            for (i, row) in e.iter().enumerate() {
                for (&j, &eij) in row.range(i + 1..) {
                    let gain = 2.0 * (eij - a[i] * a[j]);
                    if best.is_none_or(|(g, _, _)| gain > g) {
                        best = Some((gain, i, j));
                    }
                }
            }
            let Some((gain, keep, absorb)) = best else {
                break;
            };
            if gain <= MIN_GAIN {
                break;
            }

            let absorbed = std::mem::take(&mut e[absorb]);
            for (k, w) in absorbed {
                if k == keep {
                    continue;
                }
                e[k].remove(&absorb);
                *e[k].entry(keep).or_default() += w;
                *e[keep].entry(k).or_default() += w;
            }
            e[keep].remove(&absorb);
            a[keep] += a[absorb];
            a[absorb] = 0.0;
            let moved = std::mem::take(&mut members[absorb]);
            members[keep].extend(moved);
        }

        for (label, group) in members.iter().enumerate() {
            for &v in group {
                labels[v] = label;
            }
        }
        labels
    }
}
