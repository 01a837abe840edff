//! In-memory undirected graph with typed, weighted edges.
//!
//! Nodes are addressed externally by string id and internally by a dense
//! [`NodeIndex`] assigned in insertion order. The adjacency index keeps one
//! [`Neighbor`] entry per distinct adjacent node, sorted by index, so every
//! traversal visits neighbours in the same order run after run.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::GraphEngineError,
    rows::{EdgeMetadata, EdgeType, validate_strength},
};

pub type NodeIndex = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Person,
    Concept,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub attrs: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub weight: f64,
    pub edge_type: EdgeType,
    pub metadata: EdgeMetadata,
    pub attrs: Value,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: NodeIndex,
    /// Strongest weight among the typed edges joining the pair.
    pub weight: f64,
}

/// Outcome of [`Graph::upsert_edge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeUpsert {
    Created,
    Updated,
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: AHashMap<String, NodeIndex>,
    edges: Vec<Edge>,
    edge_index: AHashMap<(NodeIndex, NodeIndex, EdgeType), usize>,
    adjacency: Vec<Vec<Neighbor>>,
    typed_degree: Vec<[usize; 2]>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            index: AHashMap::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            edge_index: AHashMap::with_capacity(edges),
            adjacency: Vec::with_capacity(nodes),
            typed_degree: Vec::with_capacity(nodes),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of typed edges; a pair joined by both edge types counts twice.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct adjacent node pairs.
    pub fn pair_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    pub fn node_id(&self, index: NodeIndex) -> &str {
        &self.nodes[index].id
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up a node id, reporting unknown ids as [`GraphEngineError::NotFound`].
    pub fn require(&self, id: &str) -> Result<NodeIndex, GraphEngineError> {
        self.index_of(id)
            .ok_or_else(|| GraphEngineError::not_found(format!("node {id}")))
    }

    pub fn neighbors(&self, index: NodeIndex) -> &[Neighbor] {
        &self.adjacency[index]
    }

    pub fn degree(&self, index: NodeIndex) -> usize {
        self.adjacency[index].len()
    }

    /// Sum of neighbour weights.
    pub fn strength(&self, index: NodeIndex) -> f64 {
        self.adjacency[index].iter().map(|n| n.weight).sum()
    }

    /// Typed edge counts for a node as `(collaboration, co_employment)`.
    pub fn typed_degree(&self, index: NodeIndex) -> (usize, usize) {
        let [collab, coemp] = self.typed_degree[index];
        (collab, coemp)
    }

    pub fn weight_between(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        self.adjacency[a]
            .binary_search_by_key(&b, |n| n.index)
            .ok()
            .map(|pos| self.adjacency[a][pos].weight)
    }

    pub fn find_edge(&self, a: NodeIndex, b: NodeIndex, edge_type: EdgeType) -> Option<&Edge> {
        self.edge_index
            .get(&edge_key(a, b, edge_type))
            .map(|&pos| &self.edges[pos])
    }

    /// Degree of every node, sorted ascending.
    pub fn degree_distribution(&self) -> Vec<usize> {
        let mut degrees: Vec<usize> = self.adjacency.iter().map(Vec::len).collect();
        degrees.sort_unstable();
        degrees
    }

    /// Inserts a node; duplicate ids are rejected.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeIndex, GraphEngineError> {
        let id = node.id.trim();
        if id.is_empty() {
            return Err(GraphEngineError::invalid_input("node id must be set"));
        }
        if self.index.contains_key(id) {
            return Err(GraphEngineError::invalid_input(format!(
                "node {id} already exists"
            )));
        }
        let id = id.to_string();
        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(Node { id, ..node });
        self.adjacency.push(Vec::new());
        self.typed_degree.push([0, 0]);
        Ok(idx)
    }

    /// Returns the index for `id`, creating a bare node of `kind` when missing.
    pub fn ensure_node(&mut self, id: &str, kind: NodeKind) -> Result<NodeIndex, GraphEngineError> {
        match self.index_of(id.trim()) {
            Some(idx) => Ok(idx),
            None => self.insert_node(Node {
                id: id.to_string(),
                kind,
                attrs: Value::Object(Default::default()),
            }),
        }
    }

    /// Inserts an edge, or replaces weight and metadata of the existing edge
    /// for the same pair and type.
    pub fn upsert_edge(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        weight: f64,
        edge_type: EdgeType,
        metadata: EdgeMetadata,
        attrs: Value,
    ) -> Result<EdgeUpsert, GraphEngineError> {
        if a >= self.nodes.len() || b >= self.nodes.len() {
            return Err(GraphEngineError::not_found("edge endpoint index"));
        }
        if a == b {
            return Err(GraphEngineError::invalid_input(format!(
                "self loops are not supported ({})",
                self.nodes[a].id
            )));
        }
        validate_strength(weight)?;
        let key = edge_key(a, b, edge_type);
        let existing = self.edge_index.get(&key).copied();
        let outcome = match existing {
            Some(pos) => {
                let edge = &mut self.edges[pos];
                edge.weight = weight;
                edge.metadata = metadata;
                edge.attrs = attrs;
                EdgeUpsert::Updated
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(Edge {
                    source: key.0,
                    target: key.1,
                    weight,
                    edge_type,
                    metadata,
                    attrs,
                });
                let slot = type_slot(edge_type);
                self.typed_degree[a][slot] += 1;
                self.typed_degree[b][slot] += 1;
                EdgeUpsert::Created
            }
        };
        let pair_weight = self.pair_weight(a, b);
        link(&mut self.adjacency[a], b, pair_weight);
        link(&mut self.adjacency[b], a, pair_weight);
        Ok(outcome)
    }

    fn pair_weight(&self, a: NodeIndex, b: NodeIndex) -> f64 {
        [EdgeType::Collaboration, EdgeType::CoEmployment]
            .into_iter()
            .filter_map(|ty| self.edge_index.get(&edge_key(a, b, ty)))
            .map(|&pos| self.edges[pos].weight)
            .fold(0.0, f64::max)
    }
}

fn edge_key(a: NodeIndex, b: NodeIndex, edge_type: EdgeType) -> (NodeIndex, NodeIndex, EdgeType) {
    if a <= b {
        (a, b, edge_type)
    } else {
        (b, a, edge_type)
    }
}

fn type_slot(edge_type: EdgeType) -> usize {
    match edge_type {
        EdgeType::Collaboration => 0,
        EdgeType::CoEmployment => 1,
    }
}

fn link(list: &mut Vec<Neighbor>, index: NodeIndex, weight: f64) {
    match list.binary_search_by_key(&index, |n| n.index) {
        Ok(pos) => list[pos].weight = weight,
        Err(pos) => list.insert(pos, Neighbor { index, weight }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(id: &str) -> Node {
        Node {
            id: id.into(),
            kind: NodeKind::Person,
            attrs: json!({}),
        }
    }

    #[test]
    fn test_adjacency_sorted_and_deduplicated_across_types() {
        let mut graph = Graph::new();
        let a = graph.insert_node(person("a")).unwrap();
        let c = graph.insert_node(person("c")).unwrap();
        let b = graph.insert_node(person("b")).unwrap();
        graph
            .upsert_edge(a, b, 0.3, EdgeType::Collaboration, EdgeMetadata::default(), json!({}))
            .unwrap();
        graph
            .upsert_edge(a, c, 0.5, EdgeType::Collaboration, EdgeMetadata::default(), json!({}))
            .unwrap();
        graph
            .upsert_edge(b, a, 0.9, EdgeType::CoEmployment, EdgeMetadata::default(), json!({}))
            .unwrap();

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.pair_count(), 2);
        let order: Vec<_> = graph.neighbors(a).iter().map(|n| n.index).collect();
        assert_eq!(order, vec![c, b]);
        assert_eq!(graph.weight_between(a, b), Some(0.9));
        assert_eq!(graph.typed_degree(a), (2, 1));
    }

    #[test]
    fn test_upsert_updates_existing_edge() {
        let mut graph = Graph::new();
        let a = graph.insert_node(person("a")).unwrap();
        let b = graph.insert_node(person("b")).unwrap();
        let first = graph
            .upsert_edge(a, b, 0.8, EdgeType::Collaboration, EdgeMetadata::default(), json!({}))
            .unwrap();
        let second = graph
            .upsert_edge(b, a, 0.2, EdgeType::Collaboration, EdgeMetadata::default(), json!({}))
            .unwrap();
        assert_eq!(first, EdgeUpsert::Created);
        assert_eq!(second, EdgeUpsert::Updated);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight_between(a, b), Some(0.2));
        assert_eq!(graph.typed_degree(b), (1, 0));
    }

    #[test]
    fn test_rejects_self_loops_and_duplicate_nodes() {
        let mut graph = Graph::new();
        let a = graph.insert_node(person("a")).unwrap();
        assert!(graph.insert_node(person("a")).is_err());
        let err = graph
            .upsert_edge(a, a, 0.5, EdgeType::Collaboration, EdgeMetadata::default(), json!({}))
            .unwrap_err();
        assert!(matches!(err, GraphEngineError::InvalidInput(_)));
        assert!(matches!(
            graph.require("missing"),
            Err(GraphEngineError::NotFound(_))
        ));
    }
}
