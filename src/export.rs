//! Whole-graph serialization for external tooling.
//!
//! Nodes are written in index order and edges in insertion order, so the same
//! graph state always serializes to the same document.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    errors::GraphEngineError,
    graph::{Graph, NodeKind},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Node-link JSON document.
    #[default]
    Json,
    GraphMl,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "node-link" | "node_link" => Some(ExportFormat::Json),
            "graphml" | "xml" => Some(ExportFormat::GraphMl),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::GraphMl => "application/graphml+xml",
        }
    }
}

pub fn export(graph: &Graph, format: ExportFormat) -> Result<String, GraphEngineError> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(&node_link(graph))
            .map_err(|e| GraphEngineError::invalid_input(e.to_string())),
        ExportFormat::GraphMl => Ok(graphml(graph)),
    }
}

pub fn node_link(graph: &Graph) -> Value {
    let nodes: Vec<Value> = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            json!({
                "id": node.id,
                "kind": node.kind,
                "degree": graph.degree(idx),
                "attrs": node.attrs,
            })
        })
        .collect();
    let links: Vec<Value> = graph
        .edges()
        .iter()
        .map(|edge| {
            json!({
                "source": graph.node_id(edge.source),
                "target": graph.node_id(edge.target),
                "weight": edge.weight,
                "type": edge.edge_type,
                "metadata": edge.metadata,
                "attrs": edge.attrs,
            })
        })
        .collect();
    json!({
        "directed": false,
        "multigraph": true,
        "nodes": nodes,
        "links": links,
    })
}

pub fn graphml(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
    for (id, domain, name, ty) in [
        ("d0", "node", "kind", "string"),
        ("d1", "node", "degree", "int"),
        ("d2", "edge", "weight", "double"),
        ("d3", "edge", "edge_type", "string"),
        ("d4", "edge", "shared_units", "long"),
        ("d5", "edge", "interaction_count", "long"),
    ] {
        let _ = writeln!(
            out,
            "  <key id=\"{id}\" for=\"{domain}\" attr.name=\"{name}\" attr.type=\"{ty}\"/>"
        );
    }
    out.push_str("  <graph id=\"G\" edgedefault=\"undirected\">\n");
    for (idx, node) in graph.nodes().iter().enumerate() {
        let kind = match node.kind {
            NodeKind::Person => "person",
            NodeKind::Concept => "concept",
        };
        let _ = writeln!(
            out,
            "    <node id=\"{}\"><data key=\"d0\">{kind}</data><data key=\"d1\">{}</data></node>",
            escape_xml(&node.id),
            graph.degree(idx)
        );
    }
    for (idx, edge) in graph.edges().iter().enumerate() {
        let _ = writeln!(
            out,
            "    <edge id=\"e{idx}\" source=\"{}\" target=\"{}\"><data key=\"d2\">{}</data><data key=\"d3\">{}</data><data key=\"d4\">{}</data><data key=\"d5\">{}</data></edge>",
            escape_xml(graph.node_id(edge.source)),
            escape_xml(graph.node_id(edge.target)),
            edge.weight,
            edge.edge_type.as_str(),
            edge.metadata.shared_units,
            edge.metadata.interaction_count,
        );
    }
    out.push_str("  </graph>\n</graphml>\n");
    out
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
