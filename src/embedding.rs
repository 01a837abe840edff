//! Structural node embeddings.
//!
//! Each node maps to a fixed-length vector of structural features, all scaled
//! into `[0, 1]`. Nothing is learned: the same graph always yields the same
//! vectors, and similarity is a normalized Euclidean distance between them.

use std::cmp::Ordering;

use serde::Serialize;

use crate::{
    algo::clustering_coefficients,
    errors::GraphEngineError,
    graph::{Graph, NodeIndex},
};

pub const EMBEDDING_DIM: usize = 8;

pub type EmbeddingVector = [f64; EMBEDDING_DIM];

/// Feature names, in vector order.
pub const FEATURE_NAMES: [&str; EMBEDDING_DIM] = [
    "degree",
    "clustering",
    "degree_rank",
    "mean_neighbor_degree",
    "max_neighbor_degree",
    "mean_neighbor_clustering",
    "strength",
    "collaboration_share",
];

/// Embeddings for every node of one graph state, indexed by [`NodeIndex`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmbeddingTable {
    vectors: Vec<EmbeddingVector>,
}

impl EmbeddingTable {
    pub fn compute(graph: &Graph) -> Self {
        let n = graph.node_count();
        let degrees: Vec<usize> = (0..n).map(|idx| graph.degree(idx)).collect();
        let max_degree = degrees.iter().copied().max().unwrap_or(0).max(1) as f64;
        let clustering = clustering_coefficients(graph);
        let strengths: Vec<f64> = (0..n).map(|idx| graph.strength(idx)).collect();
        let max_strength = strengths.iter().copied().fold(0.0, f64::max);
        let mut sorted_degrees = degrees.clone();
        sorted_degrees.sort_unstable();

        let vectors = (0..n)
            .map(|idx| {
                let degree = degrees[idx];
                let neighbors = graph.neighbors(idx);
                let (mut deg_sum, mut deg_max, mut cc_sum) = (0.0, 0.0f64, 0.0);
                for neighbor in neighbors {
                    let d = degrees[neighbor.index] as f64;
                    deg_sum += d;
                    deg_max = deg_max.max(d);
                    cc_sum += clustering[neighbor.index];
                }
                let (mean_nd, mean_ncc) = if neighbors.is_empty() {
                    (0.0, 0.0)
                } else {
                    let k = neighbors.len() as f64;
                    (deg_sum / k, cc_sum / k)
                };
                let below = sorted_degrees.partition_point(|&d| d < degree);
                let rank = if n > 1 {
                    below as f64 / (n - 1) as f64
                } else {
                    0.0
                };
                let strength = if max_strength > 0.0 {
                    strengths[idx] / max_strength
                } else {
                    0.0
                };
                let (collab, coemp) = graph.typed_degree(idx);
                let collab_share = if collab + coemp > 0 {
                    collab as f64 / (collab + coemp) as f64
                } else {
                    0.0
                };
                [
                    degree as f64 / max_degree,
                    clustering[idx],
                    rank,
                    mean_nd / max_degree,
                    deg_max / max_degree,
                    mean_ncc,
                    strength,
                    collab_share,
                ]
            })
            .collect();
        Self { vectors }
    }

    pub fn get(&self, index: NodeIndex) -> &EmbeddingVector {
        &self.vectors[index]
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// `1 - ||a - b|| / sqrt(EMBEDDING_DIM)`; 1 for identical vectors.
pub fn similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f64 {
    let distance = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt();
    (1.0 - distance / (EMBEDDING_DIM as f64).sqrt()).clamp(0.0, 1.0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimilarNode {
    pub node_id: String,
    pub similarity: f64,
}

pub struct EmbeddingEngine<'a> {
    graph: &'a Graph,
    table: &'a EmbeddingTable,
}

impl<'a> EmbeddingEngine<'a> {
    pub fn new(graph: &'a Graph, table: &'a EmbeddingTable) -> Self {
        Self { graph, table }
    }

    pub fn embed(&self, node_id: &str) -> Result<EmbeddingVector, GraphEngineError> {
        let idx = self.graph.require(node_id)?;
        Ok(*self.table.get(idx))
    }

    pub fn similarity(&self, a: &str, b: &str) -> Result<f64, GraphEngineError> {
        let a = self.graph.require(a)?;
        let b = self.graph.require(b)?;
        Ok(self.similarity_by_index(a, b))
    }

    pub fn similarity_by_index(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        if a == b {
            return 1.0;
        }
        similarity(self.table.get(a), self.table.get(b))
    }

    /// Most similar nodes to `node_id`, excluding itself, highest first.
    pub fn similar_to(
        &self,
        node_id: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SimilarNode>, GraphEngineError> {
        if top_k == 0 {
            return Err(GraphEngineError::configuration("top_k must be positive"));
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(GraphEngineError::configuration(
                "min_similarity must be within [0, 1]",
            ));
        }
        let query = self.graph.require(node_id)?;
        let mut ranked: Vec<SimilarNode> = (0..self.graph.node_count())
            .filter(|&idx| idx != query)
            .map(|idx| SimilarNode {
                node_id: self.graph.node_id(idx).to_string(),
                similarity: self.similarity_by_index(query, idx),
            })
            .filter(|candidate| candidate.similarity >= min_similarity)
            .collect();
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }
}
