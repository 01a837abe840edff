//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::GraphEngineError;

/// Absolute ceiling on nodes held in memory.
pub const ABSOLUTE_MAX_NODES: usize = 50_000;

/// Absolute ceiling on the length of a sampled path, in edges.
pub const ABSOLUTE_MAX_PATH_LENGTH: usize = 16;

/// Tunables for a [`crate::GraphEngine`]. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Node cap for builds that do not pass an explicit limit.
    pub node_limit: usize,
    /// Can be lowered but never raised above [`ABSOLUTE_MAX_NODES`].
    pub max_nodes_hard_limit: usize,
    /// Largest node count for which betweenness runs exactly.
    pub betweenness_exact_threshold: usize,
    pub betweenness_sample_size: usize,
    pub sampling_seed: u64,
    pub stats_ttl_secs: u64,
    /// Path extensions allowed per path sampling call.
    pub path_visit_budget: usize,
    pub max_path_length: usize,
    pub default_path_top_k: usize,
    pub label_propagation_seed: u64,
    pub label_propagation_max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_limit: 10_000,
            max_nodes_hard_limit: ABSOLUTE_MAX_NODES,
            betweenness_exact_threshold: 500,
            betweenness_sample_size: 200,
            sampling_seed: 42,
            stats_ttl_secs: 3600,
            path_visit_budget: 10_000,
            max_path_length: 6,
            default_path_top_k: 20,
            label_propagation_seed: 7,
            label_propagation_max_iterations: 100,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, GraphEngineError> {
        let config: EngineConfig = serde_json::from_str(input)
            .map_err(|e| GraphEngineError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GraphEngineError> {
        if self.max_nodes_hard_limit == 0 || self.max_nodes_hard_limit > ABSOLUTE_MAX_NODES {
            return Err(GraphEngineError::configuration(format!(
                "max_nodes_hard_limit must be in 1..={ABSOLUTE_MAX_NODES}"
            )));
        }
        self.check_node_limit(self.node_limit)?;
        if self.betweenness_sample_size == 0 {
            return Err(GraphEngineError::configuration(
                "betweenness_sample_size must be positive",
            ));
        }
        if self.path_visit_budget == 0 {
            return Err(GraphEngineError::configuration(
                "path_visit_budget must be positive",
            ));
        }
        if self.max_path_length == 0 || self.max_path_length > ABSOLUTE_MAX_PATH_LENGTH {
            return Err(GraphEngineError::configuration(format!(
                "max_path_length must be in 1..={ABSOLUTE_MAX_PATH_LENGTH}"
            )));
        }
        if self.default_path_top_k == 0 {
            return Err(GraphEngineError::configuration(
                "default_path_top_k must be positive",
            ));
        }
        if self.label_propagation_max_iterations == 0 {
            return Err(GraphEngineError::configuration(
                "label_propagation_max_iterations must be positive",
            ));
        }
        Ok(())
    }

    pub fn check_node_limit(&self, node_limit: usize) -> Result<(), GraphEngineError> {
        if node_limit == 0 {
            return Err(GraphEngineError::configuration("node limit must be positive"));
        }
        if node_limit > self.max_nodes_hard_limit {
            return Err(GraphEngineError::configuration(format!(
                "node limit {node_limit} exceeds the hard maximum of {}; \
                 use an external graph store for graphs of this size",
                self.max_nodes_hard_limit
            )));
        }
        Ok(())
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}
