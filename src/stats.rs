use serde::Serialize;

use crate::{
    algo::{clustering_coefficients, connected_components},
    centrality::CentralityRanking,
    graph::Graph,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsOptions {
    /// Also summarize betweenness centrality. Expensive on large graphs.
    pub include_betweenness: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BetweennessStats {
    pub max: f64,
    pub mean: f64,
    pub approximate: bool,
}

impl BetweennessStats {
    pub fn from_ranking(ranking: &CentralityRanking) -> Self {
        let count = ranking.scores.len();
        let max = ranking.scores.first().map_or(0.0, |s| s.score);
        let mean = if count > 0 {
            ranking.scores.iter().map(|s| s.score).sum::<f64>() / count as f64
        } else {
            0.0
        };
        Self {
            max,
            mean,
            approximate: ranking.approximate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub avg_clustering: f64,
    pub is_connected: bool,
    pub component_count: usize,
    pub avg_degree: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub betweenness_stats: Option<BetweennessStats>,
}

impl GraphStats {
    /// Structural summary without betweenness.
    pub fn compute(graph: &Graph) -> Self {
        let n = graph.node_count();
        let pairs = graph.pair_count() as f64;
        let component_count = connected_components(graph).len();
        let (density, avg_degree, avg_clustering) = if n == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let density = if n > 1 {
                2.0 * pairs / (n * (n - 1)) as f64
            } else {
                0.0
            };
            let clustering = clustering_coefficients(graph);
            (
                density,
                2.0 * pairs / n as f64,
                clustering.iter().sum::<f64>() / n as f64,
            )
        };
        Self {
            node_count: n,
            edge_count: graph.edge_count(),
            density,
            avg_clustering,
            is_connected: component_count == 1,
            component_count,
            avg_degree,
            betweenness_stats: None,
        }
    }

    pub fn with_betweenness(mut self, ranking: &CentralityRanking) -> Self {
        self.betweenness_stats = Some(BetweennessStats::from_ranking(ranking));
        self
    }
}
