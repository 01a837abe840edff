use std::collections::VecDeque;

use crate::graph::{Graph, NodeIndex};

/// Connected components, each sorted by node index, ordered by first member.
pub fn connected_components(graph: &Graph) -> Vec<Vec<NodeIndex>> {
    let mut components = Vec::new();
    let mut visited = vec![false; graph.node_count()];
    for id in 0..graph.node_count() {
        if visited[id] {
            continue;
        }
        visited[id] = true;
        let mut queue = VecDeque::new();
        queue.push_back(id);
        let mut component = Vec::new();
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for next in graph.neighbors(node) {
                if !visited[next.index] {
                    visited[next.index] = true;
                    queue.push_back(next.index);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }
    components
}

/// Unweighted local clustering coefficient of a single node.
pub fn clustering_coefficient(graph: &Graph, node: NodeIndex) -> f64 {
    let neighbors = graph.neighbors(node);
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for (i, u) in neighbors.iter().enumerate() {
        for w in &neighbors[i + 1..] {
            if graph.weight_between(u.index, w.index).is_some() {
                links += 1;
            }
        }
    }
    (2 * links) as f64 / (k * (k - 1)) as f64
}

pub fn clustering_coefficients(graph: &Graph) -> Vec<f64> {
    (0..graph.node_count())
        .map(|idx| clustering_coefficient(graph, idx))
        .collect()
}
