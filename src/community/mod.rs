//! Community detection.
//!
//! Three interchangeable [`CommunityStrategy`] implementations share one
//! output shape. [`CommunityDetector`] probes once, at construction, whether
//! the Louvain strategy is compiled in (the `louvain` feature) and exposes the
//! answer through [`CommunityDetector::capabilities`]. Requests for an
//! unavailable strategy are served by greedy modularity, and the returned
//! [`Partition`] names the algorithm that actually ran.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::EngineConfig,
    graph::{Graph, NodeIndex},
};

mod greedy;
mod label_propagation;
#[cfg(feature = "louvain")]
mod louvain;

pub use greedy::GreedyModularity;
pub use label_propagation::LabelPropagation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityAlgorithm {
    GreedyModularity,
    LabelPropagation,
    Louvain,
}

impl CommunityAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunityAlgorithm::GreedyModularity => "greedy_modularity",
            CommunityAlgorithm::LabelPropagation => "label_propagation",
            CommunityAlgorithm::Louvain => "louvain",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "greedy" | "greedy_modularity" | "modularity" => {
                Some(CommunityAlgorithm::GreedyModularity)
            }
            "label_propagation" | "lpa" => Some(CommunityAlgorithm::LabelPropagation),
            "louvain" => Some(CommunityAlgorithm::Louvain),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Community {
    pub community_id: usize,
    pub member_ids: Vec<String>,
    pub size: usize,
    /// Internal edge weight over the number of possible internal pairs.
    pub cohesion: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Partition {
    pub requested: CommunityAlgorithm,
    pub algorithm: CommunityAlgorithm,
    pub communities: Vec<Community>,
    pub modularity: f64,
    /// False when the result depends on a random seed.
    pub deterministic: bool,
}

impl Partition {
    pub fn community_of(&self, node_id: &str) -> Option<usize> {
        self.communities
            .iter()
            .find(|c| c.member_ids.iter().any(|m| m == node_id))
            .map(|c| c.community_id)
    }

    pub fn fell_back(&self) -> bool {
        self.requested != self.algorithm
    }
}

/// A clustering algorithm producing one community label per node index.
pub trait CommunityStrategy: Send + Sync {
    fn algorithm(&self) -> CommunityAlgorithm;

    fn is_available(&self) -> bool {
        true
    }

    fn deterministic(&self) -> bool {
        true
    }

    fn assign(&self, graph: &Graph) -> Vec<usize>;
}

/// Louvain multi-level modularity optimization; needs the `louvain` feature.
#[derive(Clone, Copy, Debug, Default)]
pub struct Louvain;

impl CommunityStrategy for Louvain {
    fn algorithm(&self) -> CommunityAlgorithm {
        CommunityAlgorithm::Louvain
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "louvain")
    }

    fn assign(&self, graph: &Graph) -> Vec<usize> {
        #[cfg(feature = "louvain")]
        {
            louvain::louvain_labels(graph)
        }
        #[cfg(not(feature = "louvain"))]
        {
            GreedyModularity.assign(graph)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub louvain: bool,
}

impl Capabilities {
    pub fn probe() -> Self {
        Self {
            louvain: Louvain.is_available(),
        }
    }
}

pub struct CommunityDetector {
    capabilities: Capabilities,
    greedy: GreedyModularity,
    label_propagation: LabelPropagation,
    louvain: Louvain,
}

impl CommunityDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_capabilities(config, Capabilities::probe())
    }

    /// Builds a detector with explicit capabilities instead of probing.
    pub fn with_capabilities(config: &EngineConfig, capabilities: Capabilities) -> Self {
        debug!(louvain = capabilities.louvain, "community capabilities");
        Self {
            capabilities,
            greedy: GreedyModularity,
            label_propagation: LabelPropagation::new(
                config.label_propagation_seed,
                config.label_propagation_max_iterations,
            ),
            louvain: Louvain,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Strategy that will serve `algorithm`, after fallback.
    pub fn strategy_for(&self, algorithm: CommunityAlgorithm) -> &dyn CommunityStrategy {
        match algorithm {
            CommunityAlgorithm::GreedyModularity => &self.greedy,
            CommunityAlgorithm::LabelPropagation => &self.label_propagation,
            CommunityAlgorithm::Louvain if self.capabilities.louvain => &self.louvain,
            CommunityAlgorithm::Louvain => &self.greedy,
        }
    }

    pub fn detect(&self, graph: &Graph, algorithm: CommunityAlgorithm) -> Partition {
        let strategy = self.strategy_for(algorithm);
        if strategy.algorithm() != algorithm {
            warn!(
                requested = algorithm.as_str(),
                using = strategy.algorithm().as_str(),
                "community algorithm unavailable, falling back"
            );
        }
        let labels = strategy.assign(graph);
        let modularity = modularity(graph, &labels);
        let communities = communities_from_labels(graph, &labels);
        debug!(
            algorithm = strategy.algorithm().as_str(),
            communities = communities.len(),
            modularity,
            "communities detected"
        );
        Partition {
            requested: algorithm,
            algorithm: strategy.algorithm(),
            communities,
            modularity,
            deterministic: strategy.deterministic(),
        }
    }
}

/// Weighted modularity of a labelling, using the strongest weight per pair.
pub fn modularity(graph: &Graph, labels: &[usize]) -> f64 {
    let total: f64 = (0..graph.node_count()).map(|v| graph.strength(v)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
    let mut degree: BTreeMap<usize, f64> = BTreeMap::new();
    for v in 0..graph.node_count() {
        *degree.entry(labels[v]).or_default() += graph.strength(v);
        for n in graph.neighbors(v) {
            if labels[n.index] == labels[v] {
                *internal.entry(labels[v]).or_default() += n.weight;
            }
        }
    }
    degree
        .iter()
        .map(|(label, d)| {
            let inside = internal.get(label).copied().unwrap_or(0.0);
            inside / total - (d / total).powi(2)
        })
        .sum()
}

/// Groups nodes by label into communities ordered by size, then first member.
pub fn communities_from_labels(graph: &Graph, labels: &[usize]) -> Vec<Community> {
    let mut groups: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(idx);
    }
    let mut communities: Vec<Community> = groups
        .values()
        .map(|members| {
            let mut internal = 0.0;
            for &v in members {
                for n in graph.neighbors(v) {
                    if n.index > v && labels[n.index] == labels[v] {
                        internal += n.weight;
                    }
                }
            }
            let size = members.len();
            let pairs = size * size.saturating_sub(1) / 2;
            let cohesion = if pairs > 0 {
                internal / pairs as f64
            } else {
                0.0
            };
            let mut member_ids: Vec<String> = members
                .iter()
                .map(|&v| graph.node_id(v).to_string())
                .collect();
            member_ids.sort();
            Community {
                community_id: 0,
                member_ids,
                size,
                cohesion,
            }
        })
        .collect();
    communities.sort_by(|a, b| {
        b.size
            .cmp(&a.size)
            .then_with(|| a.member_ids.first().cmp(&b.member_ids.first()))
    });
    for (id, community) in communities.iter_mut().enumerate() {
        community.community_id = id;
    }
    communities
}
