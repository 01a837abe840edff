//! Seeded synthetic collaboration networks for benches and tests.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::rows::EdgeRow;

#[derive(Clone, Debug)]
pub struct EdgeDataset {
    pub node_count: usize,
    pub rows: Vec<EdgeRow>,
}

impl EdgeDataset {
    pub fn edges(&self) -> usize {
        self.rows.len()
    }

    pub fn node_id(idx: usize) -> String {
        format!("p{idx:06}")
    }
}

#[derive(Clone, Debug)]
pub enum GraphShape {
    Line,
    Star,
    RandomErdosRenyi { edges: usize },
    ScaleFree { m: usize },
    /// Dense groups joined by a few weak co-employment links.
    Clustered { groups: usize },
}

pub fn generate_graph(shape: GraphShape, node_count: usize, seed: u64) -> EdgeDataset {
    assert!(node_count > 1, "node_count must exceed 1");
    let mut rng = StdRng::seed_from_u64(seed);
    let pairs: Vec<(usize, usize)> = match shape {
        GraphShape::Line => (0..node_count - 1).map(|idx| (idx, idx + 1)).collect(),
        GraphShape::Star => (1..node_count).map(|leaf| (0, leaf)).collect(),
        GraphShape::RandomErdosRenyi { edges } => random_pairs(node_count, edges, &mut rng),
        GraphShape::ScaleFree { m } => scale_free_pairs(node_count, m, &mut rng),
        GraphShape::Clustered { groups } => clustered_pairs(node_count, groups, &mut rng),
    };
    let rows = pairs
        .into_iter()
        .map(|(a, b)| {
            let strength = rng.gen_range(0.05..=1.0);
            let (a, b) = (EdgeDataset::node_id(a), EdgeDataset::node_id(b));
            if rng.gen_range(0..4) == 0 {
                EdgeRow::co_employment(&a, &b, strength)
            } else {
                EdgeRow::collaboration(&a, &b, strength)
            }
        })
        .collect();
    EdgeDataset { node_count, rows }
}

fn random_pairs(node_count: usize, edge_count: usize, rng: &mut StdRng) -> Vec<(usize, usize)> {
    let total_pairs = node_count * (node_count - 1) / 2;
    assert!(edge_count <= total_pairs, "edge_count exceeds possible pairs");
    let mut seen = ahash::AHashSet::with_capacity(edge_count);
    let mut pairs = Vec::with_capacity(edge_count);
    while pairs.len() < edge_count {
        let a = rng.gen_range(0..node_count);
        let b = rng.gen_range(0..node_count);
        if a == b {
            continue;
        }
        let pair = (a.min(b), a.max(b));
        if seen.insert(pair) {
            pairs.push(pair);
        }
    }
    pairs
}

fn scale_free_pairs(node_count: usize, m: usize, rng: &mut StdRng) -> Vec<(usize, usize)> {
    assert!(m > 0, "m must be positive");
    assert!(node_count > m + 1, "node_count must exceed m + 1");
    let mut degrees = vec![0usize; node_count];
    let mut pairs = Vec::new();
    let seed_nodes = m + 1;
    for u in 0..seed_nodes {
        for v in (u + 1)..seed_nodes {
            pairs.push((u, v));
            degrees[u] += 1;
            degrees[v] += 1;
        }
    }
    let mut total_degree: usize = degrees.iter().sum();
    for new_node in seed_nodes..node_count {
        let mut targets = Vec::with_capacity(m);
        while targets.len() < m {
            let pick = rng.gen_range(0..total_degree);
            let mut cumulative = 0usize;
            for candidate in 0..new_node {
                cumulative += degrees[candidate];
                if pick < cumulative {
                    if !targets.contains(&candidate) {
                        targets.push(candidate);
                    }
                    break;
                }
            }
        }
        targets.sort_unstable();
        for target in targets {
            pairs.push((target, new_node));
            degrees[target] += 1;
            degrees[new_node] += 1;
            total_degree += 2;
        }
    }
    pairs
}

fn clustered_pairs(node_count: usize, groups: usize, rng: &mut StdRng) -> Vec<(usize, usize)> {
    assert!(groups > 0 && groups <= node_count, "groups must be in 1..=node_count");
    let mut pairs = Vec::new();
    let group_of = |idx: usize| idx % groups;
    for a in 0..node_count {
        for b in (a + 1)..node_count {
            if group_of(a) == group_of(b) && rng.gen_range(0..10) < 6 {
                pairs.push((a, b));
            }
        }
    }
    for g in 0..groups.saturating_sub(1) {
        pairs.push((g, g + 1));
    }
    pairs
}
