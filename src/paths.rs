//! Novelty-ranked path discovery between two node sets.
//!
//! [`PathSampler`] enumerates simple paths from any start node to any end
//! node with a bounded depth-first walk. Each path is scored by how
//! structurally different its intermediate nodes are from one another, so
//! routes through unrelated neighbourhoods rank above the obvious ones.

use std::cmp::Ordering;

use ahash::AHashSet;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::{ABSOLUTE_MAX_PATH_LENGTH, EngineConfig},
    embedding::{EmbeddingTable, similarity},
    errors::GraphEngineError,
    graph::{Graph, NodeIndex},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// Number of ranked paths to keep; the configured default when unset.
    pub top_k: Option<usize>,
    /// Return `ApproximationBudgetExceeded` instead of a truncated result.
    pub fail_on_budget: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedPath {
    pub path: Vec<String>,
    pub novelty_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathSamplingResult {
    pub paths: Vec<RankedPath>,
    /// Set when exploration stopped at the visit budget.
    pub truncated: bool,
    /// Path extensions performed.
    pub visited: usize,
}

pub struct PathSampler<'a> {
    graph: &'a Graph,
    embeddings: &'a EmbeddingTable,
    max_path_length: usize,
    visit_budget: usize,
    default_top_k: usize,
}

impl<'a> PathSampler<'a> {
    pub fn new(graph: &'a Graph, embeddings: &'a EmbeddingTable, config: &EngineConfig) -> Self {
        Self {
            graph,
            embeddings,
            max_path_length: config.max_path_length.min(ABSOLUTE_MAX_PATH_LENGTH),
            visit_budget: config.path_visit_budget,
            default_top_k: config.default_path_top_k,
        }
    }

    /// Simple paths of 1..=`max_length` edges from `start` to `end`, best
    /// novelty first.
    ///
    /// A walk ends at the first end node it reaches, so a path never passes
    /// through one end node on its way to another: with `S - E1 - E2` and both
    /// `E1` and `E2` in `end`, only `S - E1` is reported.
    ///
    /// # Errors
    ///
    /// [`GraphEngineError::Configuration`] for a `max_length` outside
    /// `1..=max_path_length` or a zero `top_k`; [`GraphEngineError::NotFound`]
    /// for any unknown id; [`GraphEngineError::ApproximationBudgetExceeded`]
    /// when the budget runs out and `fail_on_budget` is set.
    pub fn sample_paths<S: AsRef<str>>(
        &self,
        start: &[S],
        end: &[S],
        max_length: usize,
        options: PathOptions,
    ) -> Result<PathSamplingResult, GraphEngineError> {
        if max_length == 0 || max_length > self.max_path_length {
            return Err(GraphEngineError::configuration(format!(
                "max_length must be in 1..={}",
                self.max_path_length
            )));
        }
        let top_k = options.top_k.unwrap_or(self.default_top_k);
        if top_k == 0 {
            return Err(GraphEngineError::configuration("top_k must be positive"));
        }
        let starts = self.resolve(start)?;
        let ends = self.resolve(end)?;

        let mut is_end = vec![false; self.graph.node_count()];
        for &idx in &ends {
            is_end[idx] = true;
        }
        let mut walk = Walk {
            graph: self.graph,
            is_end: &is_end,
            on_path: vec![false; self.graph.node_count()],
            path: Vec::with_capacity(max_length + 1),
            max_length,
            budget: self.visit_budget,
            visited: 0,
            exhausted: false,
            seen: AHashSet::new(),
            found: Vec::new(),
        };
        for &s in &starts {
            if walk.exhausted {
                break;
            }
            walk.path.push(s);
            walk.on_path[s] = true;
            walk.extend(s);
            walk.on_path[s] = false;
            walk.path.pop();
        }

        if walk.exhausted {
            if options.fail_on_budget {
                return Err(GraphEngineError::budget_exceeded(format!(
                    "path exploration stopped after {} extensions",
                    walk.visited
                )));
            }
            warn!(
                budget = self.visit_budget,
                found = walk.found.len(),
                "path exploration truncated"
            );
        }

        let mut paths: Vec<RankedPath> = walk
            .found
            .iter()
            .map(|path| RankedPath {
                path: path
                    .iter()
                    .map(|&idx| self.graph.node_id(idx).to_string())
                    .collect(),
                novelty_score: self.novelty(path),
            })
            .collect();
        paths.sort_by(|a, b| {
            b.novelty_score
                .partial_cmp(&a.novelty_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.path.len().cmp(&b.path.len()))
                .then_with(|| a.path.cmp(&b.path))
        });
        paths.truncate(top_k);
        debug!(
            starts = starts.len(),
            ends = ends.len(),
            visited = walk.visited,
            returned = paths.len(),
            "path sampling finished"
        );
        Ok(PathSamplingResult {
            paths,
            truncated: walk.exhausted,
            visited: walk.visited,
        })
    }

    /// Mean pairwise dissimilarity of the intermediate nodes; 0 below two.
    pub fn novelty(&self, path: &[NodeIndex]) -> f64 {
        if path.len() < 4 {
            return 0.0;
        }
        let inner = &path[1..path.len() - 1];
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (i, &a) in inner.iter().enumerate() {
            for &b in &inner[i + 1..] {
                total += 1.0 - similarity(self.embeddings.get(a), self.embeddings.get(b));
                pairs += 1;
            }
        }
        total / pairs as f64
    }

    fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<NodeIndex>, GraphEngineError> {
        let mut resolved = ids
            .iter()
            .map(|id| self.graph.require(id.as_ref().trim()))
            .collect::<Result<Vec<_>, _>>()?;
        resolved.sort_by(|a, b| self.graph.node_id(*a).cmp(self.graph.node_id(*b)));
        resolved.dedup();
        Ok(resolved)
    }
}

struct Walk<'g, 'e> {
    graph: &'g Graph,
    is_end: &'e [bool],
    on_path: Vec<bool>,
    path: Vec<NodeIndex>,
    max_length: usize,
    budget: usize,
    visited: usize,
    exhausted: bool,
    seen: AHashSet<Vec<NodeIndex>>,
    found: Vec<Vec<NodeIndex>>,
}

impl Walk<'_, '_> {
    fn extend(&mut self, node: NodeIndex) {
        let edges = self.path.len() - 1;
        if edges > 0 && self.is_end[node] {
            self.record();
            return;
        }
        if edges >= self.max_length {
            return;
        }
        let graph = self.graph;
        for neighbor in graph.neighbors(node) {
            let next = neighbor.index;
            if self.on_path[next] {
                continue;
            }
            if self.visited >= self.budget {
                self.exhausted = true;
                return;
            }
            self.visited += 1;
            self.path.push(next);
            self.on_path[next] = true;
            self.extend(next);
            self.on_path[next] = false;
            self.path.pop();
            if self.exhausted {
                return;
            }
        }
    }

    fn record(&mut self) {
        let mut key = self.path.clone();
        if key.first() > key.last() {
            key.reverse();
        }
        if self.seen.insert(key) {
            self.found.push(self.path.clone());
        }
    }
}
