//! Degree and betweenness centrality.
//!
//! Betweenness uses Brandes' accumulation over unweighted shortest paths.
//! Graphs larger than the configured exact threshold are estimated from a
//! seeded sample of source nodes, scaled by `n / k`, and flagged approximate.

use std::{cmp::Ordering, collections::VecDeque};

use rand::{SeedableRng, rngs::StdRng, seq::index};
use serde::Serialize;
use tracing::debug;

use crate::{config::EngineConfig, errors::GraphEngineError, graph::Graph};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeScore {
    pub node_id: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CentralityRanking {
    pub scores: Vec<NodeScore>,
    pub approximate: bool,
    /// Number of source nodes used when `approximate` is set.
    pub sampled_sources: Option<usize>,
}

impl CentralityRanking {
    pub fn top(&self, limit: usize) -> &[NodeScore] {
        &self.scores[..limit.min(self.scores.len())]
    }

    pub fn score_of(&self, node_id: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.node_id == node_id)
            .map(|s| s.score)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BetweennessOptions {
    /// Overrides the configured sample size for large graphs.
    pub sample_size: Option<usize>,
    /// Fail with `ApproximationBudgetExceeded` instead of sampling.
    pub require_exact: bool,
}

pub struct CentralityEngine<'a> {
    graph: &'a Graph,
    exact_threshold: usize,
    default_sample: usize,
    seed: u64,
}

impl<'a> CentralityEngine<'a> {
    pub fn new(graph: &'a Graph, config: &EngineConfig) -> Self {
        Self {
            graph,
            exact_threshold: config.betweenness_exact_threshold,
            default_sample: config.betweenness_sample_size,
            seed: config.sampling_seed,
        }
    }

    /// `degree / (n - 1)` for every node, highest first.
    pub fn degree_centrality(&self) -> Vec<NodeScore> {
        let n = self.graph.node_count();
        let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
        let scores = (0..n)
            .map(|idx| self.graph.degree(idx) as f64 * scale)
            .collect::<Vec<_>>();
        rank(self.graph, &scores)
    }

    pub fn betweenness_centrality(
        &self,
        options: BetweennessOptions,
    ) -> Result<CentralityRanking, GraphEngineError> {
        let n = self.graph.node_count();
        let sample_size = options.sample_size.unwrap_or(self.default_sample);
        if sample_size == 0 {
            return Err(GraphEngineError::configuration(
                "betweenness sample size must be positive",
            ));
        }
        let sampled = n > self.exact_threshold && sample_size < n;
        if sampled && options.require_exact {
            return Err(GraphEngineError::budget_exceeded(format!(
                "exact betweenness requested on {n} nodes; threshold is {}",
                self.exact_threshold
            )));
        }
        let sources: Vec<usize> = if sampled {
            let mut rng = StdRng::seed_from_u64(self.seed);
            let mut picked = index::sample(&mut rng, n, sample_size).into_vec();
            picked.sort_unstable();
            picked
        } else {
            (0..n).collect()
        };
        debug!(
            nodes = n,
            sources = sources.len(),
            sampled,
            "computing betweenness"
        );
        let raw = brandes(self.graph, &sources);
        let extrapolate = if sampled {
            n as f64 / sources.len() as f64
        } else {
            1.0
        };
        let norm = if n > 2 {
            1.0 / ((n - 1) * (n - 2)) as f64
        } else {
            0.0
        };
        let scores: Vec<f64> = raw.iter().map(|v| v * extrapolate * norm).collect();
        Ok(CentralityRanking {
            scores: rank(self.graph, &scores),
            approximate: sampled,
            sampled_sources: sampled.then_some(sources.len()),
        })
    }
}

/// Unnormalized dependency sums over the given BFS sources.
fn brandes(graph: &Graph, sources: &[usize]) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    for &s in sources {
        for v in 0..n {
            sigma[v] = 0.0;
            dist[v] = -1;
            delta[v] = 0.0;
            preds[v].clear();
        }
        order.clear();
        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for next in graph.neighbors(v) {
                let w = next.index;
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }
        while let Some(w) = order.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }
    centrality
}

fn rank(graph: &Graph, scores: &[f64]) -> Vec<NodeScore> {
    let mut ranked: Vec<NodeScore> = scores
        .iter()
        .enumerate()
        .map(|(idx, &score)| NodeScore {
            node_id: graph.node_id(idx).to_string(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::GraphBuilder, rows::EdgeRow};

    fn star(leaves: usize) -> Graph {
        let rows = (0..leaves)
            .map(|i| EdgeRow::collaboration("hub", &format!("leaf{i:02}"), 0.5))
            .collect::<Vec<_>>();
        GraphBuilder::default().build(rows, 1000).unwrap().graph
    }

    #[test]
    fn test_star_hub_has_unit_betweenness() {
        let graph = star(5);
        let engine = CentralityEngine::new(&graph, &EngineConfig::default());
        let ranking = engine
            .betweenness_centrality(BetweennessOptions::default())
            .unwrap();
        assert!(!ranking.approximate);
        assert_eq!(ranking.scores[0].node_id, "hub");
        assert!((ranking.scores[0].score - 1.0).abs() < 1e-9);
        assert_eq!(ranking.score_of("leaf00"), Some(0.0));
    }

    #[test]
    fn test_large_graph_is_sampled_and_flagged() {
        let graph = star(40);
        let config = EngineConfig {
            betweenness_exact_threshold: 10,
            betweenness_sample_size: 8,
            ..EngineConfig::default()
        };
        let engine = CentralityEngine::new(&graph, &config);
        let ranking = engine
            .betweenness_centrality(BetweennessOptions::default())
            .unwrap();
        assert!(ranking.approximate);
        assert_eq!(ranking.sampled_sources, Some(8));

        let strict = engine.betweenness_centrality(BetweennessOptions {
            require_exact: true,
            ..BetweennessOptions::default()
        });
        assert!(matches!(
            strict,
            Err(GraphEngineError::ApproximationBudgetExceeded(_))
        ));
    }

    #[test]
    fn test_degree_centrality_normalized() {
        let graph = star(4);
        let engine = CentralityEngine::new(&graph, &EngineConfig::default());
        let scores = engine.degree_centrality();
        assert_eq!(scores[0].node_id, "hub");
        assert_eq!(scores[0].score, 1.0);
        assert_eq!(scores[1].score, 0.25);
    }
}
