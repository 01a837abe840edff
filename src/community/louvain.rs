use std::collections::BTreeMap;

use crate::graph::Graph;

const MIN_GAIN: f64 = 1e-12;
const MAX_PASSES: usize = 100;

/// Weighted graph at one aggregation level.
struct Level {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl Level {
    fn from_graph(graph: &Graph) -> Self {
        Self {
            adjacency: (0..graph.node_count())
                .map(|v| {
                    graph
                        .neighbors(v)
                        .iter()
                        .map(|nb| (nb.index, nb.weight))
                        .collect()
                })
                .collect(),
            self_loops: vec![0.0; graph.node_count()],
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    fn degree(&self, v: usize) -> f64 {
        self.adjacency[v].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[v]
    }

    fn aggregate(&self, labels: &[usize], communities: usize) -> Level {
        let mut self_loops = vec![0.0; communities];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); communities];
        for v in 0..self.len() {
            let cv = labels[v];
            self_loops[cv] += self.self_loops[v];
            for &(u, w) in &self.adjacency[v] {
                let cu = labels[u];
                if cu == cv {
                    self_loops[cv] += w / 2.0;
                } else {
                    *links[cv].entry(cu).or_default() += w;
                }
            }
        }
        Level {
            adjacency: links
                .into_iter()
                .map(|row| row.into_iter().collect())
                .collect(),
            self_loops,
        }
    }

    /// Local moving phase; returns compact labels and whether any node moved.
    fn local_moves(&self, two_m: f64) -> (Vec<usize>, bool) {
        let n = self.len();
        let degrees: Vec<f64> = (0..n).map(|v| self.degree(v)).collect();
        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = degrees.clone();
        let mut improved = false;
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();

        for _ in 0..MAX_PASSES {
            let mut moved = false;
            for v in 0..n {
                let current = community[v];
                let k = degrees[v];
                weights.clear();
                for &(u, w) in &self.adjacency[v] {
                    *weights.entry(community[u]).or_default() += w;
                }
                totals[current] -= k;
                let mut best = current;
                let mut best_gain =
                    weights.get(&current).copied().unwrap_or(0.0) - totals[current] * k / two_m;
                for (&c, &w) in &weights {
                    let gain = w - totals[c] * k / two_m;
                    if gain > best_gain + MIN_GAIN {
                        best = c;
                        best_gain = gain;
                    }
                }
                totals[best] += k;
                if best != current {
                    community[v] = best;
                    moved = true;
                    improved = true;
                }
            }
            if !moved {
                break;
            }
        }
        (compact(&community), improved)
    }
}

fn compact(labels: &[usize]) -> Vec<usize> {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let mut next = 0;
    labels
        .iter()
        .map(|label| {
            *mapping.entry(*label).or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

/// Louvain community labels, indexed by node.
pub(super) fn louvain_labels(graph: &Graph) -> Vec<usize> {
    let mut membership: Vec<usize> = (0..graph.node_count()).collect();
    let two_m: f64 = (0..graph.node_count()).map(|v| graph.strength(v)).sum();
    if two_m <= 0.0 {
        return membership;
    }
    let mut level = Level::from_graph(graph);
    loop {
        let (labels, improved) = level.local_moves(two_m);
        if !improved {
            break;
        }
        for slot in membership.iter_mut() {
            *slot = labels[*slot];
        }
        let communities = labels.iter().copied().max().map_or(0, |m| m + 1);
        level = level.aggregate(&labels, communities);
    }
    membership
}
