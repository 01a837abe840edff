//! Graph construction from edge rows.
//!
//! Rows are sorted into a canonical order before anything is admitted, so the
//! same multiset of rows always produces the same node indices, edge set and
//! degree distribution regardless of the order the source streamed them in.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    config::{ABSOLUTE_MAX_NODES, EngineConfig},
    errors::GraphEngineError,
    graph::{Graph, NodeKind},
    rows::{EdgeMetadata, EdgeRow, EdgeType},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub rows_received: usize,
    pub self_loops_skipped: usize,
    pub duplicates_merged: usize,
    pub rows_dropped_by_node_cap: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

impl BuildReport {
    pub fn truncated(&self) -> bool {
        self.rows_dropped_by_node_cap > 0
    }
}

#[derive(Clone, Debug)]
pub struct BuiltGraph {
    pub graph: Graph,
    pub report: BuildReport,
}

#[derive(Clone, Debug)]
pub struct GraphBuilder {
    max_nodes: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            max_nodes: ABSOLUTE_MAX_NODES,
        }
    }
}

struct MergedEdge {
    source: String,
    target: String,
    edge_type: EdgeType,
    weight: f64,
    metadata: EdgeMetadata,
}

impl GraphBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_nodes: config.max_nodes_hard_limit,
        }
    }

    /// Builds a graph holding at most `node_limit` nodes.
    ///
    /// # Errors
    ///
    /// [`GraphEngineError::Configuration`] when `node_limit` is zero or above
    /// the hard maximum; [`GraphEngineError::InvalidInput`] when a row carries
    /// a blank id or an out-of-range strength. Nothing is returned on error.
    pub fn build<I>(&self, rows: I, node_limit: usize) -> Result<BuiltGraph, GraphEngineError>
    where
        I: IntoIterator<Item = EdgeRow>,
    {
        if node_limit == 0 || node_limit > self.max_nodes {
            return Err(GraphEngineError::configuration(format!(
                "node limit {node_limit} outside 1..={}; graphs of this size need an external graph store",
                self.max_nodes
            )));
        }
        let mut report = BuildReport::default();
        let mut rows: Vec<EdgeRow> = rows.into_iter().collect();
        report.rows_received = rows.len();
        rows.retain(|row| {
            let (a, b) = row.canonical_endpoints();
            a != b
        });
        report.self_loops_skipped = report.rows_received - rows.len();
        rows.sort_by(|a, b| a.canonical_cmp(b));

        let merged = merge_duplicates(&rows, &mut report);
        let mut graph = Graph::with_capacity(node_limit.min(merged.len() * 2), merged.len());
        for edge in merged {
            let missing = [&edge.source, &edge.target]
                .iter()
                .filter(|id| !graph.contains(id))
                .count();
            if graph.node_count() + missing > node_limit {
                report.rows_dropped_by_node_cap += 1;
                continue;
            }
            let a = graph.ensure_node(&edge.source, NodeKind::Person)?;
            let b = graph.ensure_node(&edge.target, NodeKind::Person)?;
            graph.upsert_edge(
                a,
                b,
                edge.weight,
                edge.edge_type,
                edge.metadata,
                Value::Object(Default::default()),
            )?;
        }
        report.node_count = graph.node_count();
        report.edge_count = graph.edge_count();
        if report.truncated() {
            warn!(
                node_limit,
                dropped = report.rows_dropped_by_node_cap,
                "node cap reached; rows touching excluded nodes were dropped"
            );
        }
        debug!(
            merged = report.duplicates_merged,
            self_loops = report.self_loops_skipped,
            "edge rows normalized"
        );
        info!(
            nodes = report.node_count,
            edges = report.edge_count,
            "graph built"
        );
        Ok(BuiltGraph { graph, report })
    }
}

fn merge_duplicates(rows: &[EdgeRow], report: &mut BuildReport) -> Vec<MergedEdge> {
    let mut merged: Vec<MergedEdge> = Vec::with_capacity(rows.len());
    for row in rows {
        let (a, b) = row.canonical_endpoints();
        if let Some(last) = merged.last_mut() {
            if last.source == a && last.target == b && last.edge_type == row.edge_type() {
                last.weight = last.weight.max(row.strength());
                last.metadata.merge(&row.metadata());
                report.duplicates_merged += 1;
                continue;
            }
        }
        merged.push(MergedEdge {
            source: a.to_string(),
            target: b.to_string(),
            edge_type: row.edge_type(),
            weight: row.strength(),
            metadata: row.metadata(),
        });
    }
    merged
}
