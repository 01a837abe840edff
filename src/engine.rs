//! The owned engine context.
//!
//! [`GraphEngine`] holds the current graph (if any) behind a read-write lock
//! together with the metric cache and the community detector. Queries take
//! the read lock and may run concurrently; rebuilds and incremental updates
//! take the write lock and flush the cache before releasing it, so no reader
//! ever sees a metric computed from a different graph state.
//!
//! Creating an engine does no graph work. Until the first successful build
//! every query returns [`GraphEngineError::NotInitialized`].

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    builder::{BuildReport, GraphBuilder},
    cache::{CacheStats, MetricCache},
    centrality::{BetweennessOptions, CentralityEngine, CentralityRanking, NodeScore},
    community::{Capabilities, CommunityAlgorithm, CommunityDetector, Partition},
    config::EngineConfig,
    embedding::{EmbeddingEngine, EmbeddingTable, EmbeddingVector, SimilarNode},
    errors::GraphEngineError,
    export::{ExportFormat, export},
    graph::{EdgeUpsert, Graph, Node, NodeKind},
    paths::{PathOptions, PathSampler, PathSamplingResult},
    rows::{EdgeMetadata, EdgeRow, EdgeType, validate_strength},
    source::EdgeSource,
    stats::{GraphStats, StatsOptions},
};

const EMBEDDINGS_KEY: &str = "embeddings";
const STATS_KEY: &str = "stats";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineStatus {
    NotBuilt,
    Built {
        node_count: usize,
        edge_count: usize,
        generation: u64,
    },
}

/// Acknowledgement returned by incremental updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MutationAck {
    /// False when an existing edge was updated in place.
    pub created: bool,
    pub nodes_created: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Arguments for [`GraphEngine::add_edge`].
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub edge_type: EdgeType,
    pub metadata: EdgeMetadata,
    pub attrs: Value,
    /// Create unknown endpoints as person nodes instead of failing.
    pub create_missing: bool,
}

impl EdgeSpec {
    pub fn new(source: &str, target: &str, weight: f64) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            weight,
            edge_type: EdgeType::Collaboration,
            metadata: EdgeMetadata::default(),
            attrs: Value::Object(Default::default()),
            create_missing: false,
        }
    }

    pub fn edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    pub fn create_missing(mut self, create_missing: bool) -> Self {
        self.create_missing = create_missing;
        self
    }

    pub fn attrs(mut self, attrs: Value) -> Self {
        self.attrs = attrs;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Connector {
    pub node_id: String,
    pub betweenness_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeyConnectors {
    pub connectors: Vec<Connector>,
    pub approximate: bool,
}

#[derive(Default)]
struct EngineState {
    graph: Option<Graph>,
    generation: u64,
    last_report: Option<BuildReport>,
}

pub struct GraphEngine {
    config: EngineConfig,
    state: RwLock<EngineState>,
    cache: MetricCache,
    detector: CommunityDetector,
}

impl Default for GraphEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        let detector = CommunityDetector::new(&config);
        Self {
            config,
            state: RwLock::new(EngineState::default()),
            cache: MetricCache::new(),
            detector,
        }
    }
}

impl GraphEngine {
    pub fn new(config: EngineConfig) -> Result<Self, GraphEngineError> {
        config.validate()?;
        let detector = CommunityDetector::new(&config);
        Ok(Self {
            config,
            state: RwLock::new(EngineState::default()),
            cache: MetricCache::new(),
            detector,
        })
    }

    /// Engine whose community detector uses the given capabilities.
    pub fn with_capabilities(
        config: EngineConfig,
        capabilities: Capabilities,
    ) -> Result<Self, GraphEngineError> {
        config.validate()?;
        let detector = CommunityDetector::with_capabilities(&config, capabilities);
        Ok(Self {
            config,
            state: RwLock::new(EngineState::default()),
            cache: MetricCache::new(),
            detector,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.detector.capabilities()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.read();
        match &state.graph {
            None => EngineStatus::NotBuilt,
            Some(graph) => EngineStatus::Built {
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                generation: state.generation,
            },
        }
    }

    pub fn last_build_report(&self) -> Option<BuildReport> {
        self.state.read().last_report.clone()
    }

    /// Replaces the graph with one built from `rows`.
    ///
    /// The new graph is constructed before the write lock is taken; on error
    /// the current graph and cache stay exactly as they were.
    pub fn build<I>(&self, rows: I, node_limit: Option<usize>) -> Result<BuildReport, GraphEngineError>
    where
        I: IntoIterator<Item = EdgeRow>,
    {
        let node_limit = node_limit.unwrap_or(self.config.node_limit);
        let built = GraphBuilder::new(&self.config).build(rows, node_limit)?;
        let mut state = self.state.write();
        state.graph = Some(built.graph);
        state.generation += 1;
        state.last_report = Some(built.report.clone());
        self.cache.clear();
        info!(
            generation = state.generation,
            nodes = built.report.node_count,
            edges = built.report.edge_count,
            "graph replaced"
        );
        Ok(built.report)
    }

    /// Fetches every edge from `source` and rebuilds.
    pub fn rebuild_from(
        &self,
        source: &dyn EdgeSource,
        node_limit: Option<usize>,
    ) -> Result<BuildReport, GraphEngineError> {
        let rows = source.fetch_edges()?;
        self.build(rows, node_limit)
    }

    pub fn stats(&self, options: StatsOptions) -> Result<GraphStats, GraphEngineError> {
        self.read(|graph| {
            let base = self.cache.get_or_compute(STATS_KEY, Some(self.config.stats_ttl()), || {
                Ok(GraphStats::compute(graph))
            })?;
            let stats = (*base).clone();
            if options.include_betweenness {
                let ranking = self.cached_betweenness(graph, BetweennessOptions::default())?;
                return Ok(stats.with_betweenness(&ranking));
            }
            Ok(stats)
        })
    }

    pub fn degree_centrality(&self) -> Result<Vec<NodeScore>, GraphEngineError> {
        self.read(|graph| Ok(CentralityEngine::new(graph, &self.config).degree_centrality()))
    }

    pub fn betweenness(
        &self,
        options: BetweennessOptions,
    ) -> Result<CentralityRanking, GraphEngineError> {
        self.read(|graph| {
            self.cached_betweenness(graph, options)
                .map(|ranking| (*ranking).clone())
        })
    }

    /// Top `limit` nodes by betweenness.
    pub fn key_connectors(&self, limit: usize) -> Result<KeyConnectors, GraphEngineError> {
        self.read(|graph| {
            if limit == 0 {
                return Err(GraphEngineError::configuration("limit must be positive"));
            }
            let ranking = self.cached_betweenness(graph, BetweennessOptions::default())?;
            Ok(KeyConnectors {
                connectors: ranking
                    .top(limit)
                    .iter()
                    .map(|score| Connector {
                        node_id: score.node_id.clone(),
                        betweenness_score: score.score,
                    })
                    .collect(),
                approximate: ranking.approximate,
            })
        })
    }

    pub fn embed(&self, node_id: &str) -> Result<EmbeddingVector, GraphEngineError> {
        self.read(|graph| {
            let table = self.embeddings(graph)?;
            EmbeddingEngine::new(graph, &table).embed(node_id)
        })
    }

    pub fn similarity(&self, a: &str, b: &str) -> Result<f64, GraphEngineError> {
        self.read(|graph| {
            let table = self.embeddings(graph)?;
            EmbeddingEngine::new(graph, &table).similarity(a, b)
        })
    }

    pub fn similar_people(
        &self,
        node_id: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SimilarNode>, GraphEngineError> {
        self.read(|graph| {
            let table = self.embeddings(graph)?;
            EmbeddingEngine::new(graph, &table).similar_to(node_id, top_k, min_similarity)
        })
    }

    pub fn communities(&self, algorithm: CommunityAlgorithm) -> Result<Partition, GraphEngineError> {
        self.read(|graph| {
            let key = format!("communities:{}", algorithm.as_str());
            let partition = self
                .cache
                .get_or_compute(&key, None, || Ok(self.detector.detect(graph, algorithm)))?;
            Ok((*partition).clone())
        })
    }

    pub fn path_sampling<S: AsRef<str>>(
        &self,
        start: &[S],
        end: &[S],
        max_length: usize,
        options: PathOptions,
    ) -> Result<PathSamplingResult, GraphEngineError> {
        self.read(|graph| {
            let table = self.embeddings(graph)?;
            PathSampler::new(graph, &table, &self.config).sample_paths(start, end, max_length, options)
        })
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, GraphEngineError> {
        self.read(|graph| export(graph, format))
    }

    /// Adds a node; the id must be new.
    pub fn add_node(&self, node: Node) -> Result<MutationAck, GraphEngineError> {
        self.mutate(|graph| {
            let id = node.id.clone();
            graph.insert_node(node)?;
            info!(node = %id, "node added");
            Ok(MutationAck {
                created: true,
                nodes_created: 1,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
            })
        })
    }

    pub fn add_person(&self, id: &str, attrs: Value) -> Result<MutationAck, GraphEngineError> {
        self.add_node(Node {
            id: id.to_string(),
            kind: NodeKind::Person,
            attrs,
        })
    }

    /// Adds an edge, or updates the existing edge of the same pair and type.
    pub fn add_edge(&self, spec: EdgeSpec) -> Result<MutationAck, GraphEngineError> {
        let source = spec.source.trim();
        let target = spec.target.trim();
        self.mutate(|graph| {
            if source.is_empty() || target.is_empty() {
                return Err(GraphEngineError::invalid_input(
                    "edge endpoints must be non-empty ids",
                ));
            }
            if source == target {
                return Err(GraphEngineError::invalid_input(format!(
                    "self loops are not supported ({source})"
                )));
            }
            validate_strength(spec.weight)?;
            let before = graph.node_count();
            if !spec.create_missing {
                graph.require(source)?;
                graph.require(target)?;
            }
            let a = graph.ensure_node(source, NodeKind::Person)?;
            let b = graph.ensure_node(target, NodeKind::Person)?;
            let outcome = graph.upsert_edge(
                a,
                b,
                spec.weight,
                spec.edge_type,
                spec.metadata.clone(),
                spec.attrs.clone(),
            )?;
            info!(
                source,
                target,
                edge_type = spec.edge_type.as_str(),
                updated = outcome == EdgeUpsert::Updated,
                "edge added"
            );
            Ok(MutationAck {
                created: outcome == EdgeUpsert::Created,
                nodes_created: graph.node_count() - before,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
            })
        })
    }

    fn read<T, F>(&self, f: F) -> Result<T, GraphEngineError>
    where
        F: FnOnce(&Graph) -> Result<T, GraphEngineError>,
    {
        let state = self.state.read();
        let graph = state.graph.as_ref().ok_or_else(not_built)?;
        f(graph)
    }

    fn mutate<T, F>(&self, f: F) -> Result<T, GraphEngineError>
    where
        F: FnOnce(&mut Graph) -> Result<T, GraphEngineError>,
    {
        let mut state = self.state.write();
        let graph = state.graph.as_mut().ok_or_else(not_built)?;
        let out = f(graph)?;
        self.cache.clear();
        debug!("metric cache flushed after mutation");
        Ok(out)
    }

    fn embeddings(&self, graph: &Graph) -> Result<Arc<EmbeddingTable>, GraphEngineError> {
        self.cache
            .get_or_compute(EMBEDDINGS_KEY, None, || Ok(EmbeddingTable::compute(graph)))
    }

    fn cached_betweenness(
        &self,
        graph: &Graph,
        options: BetweennessOptions,
    ) -> Result<Arc<CentralityRanking>, GraphEngineError> {
        let key = match (options.require_exact, options.sample_size) {
            (true, _) => "betweenness:exact".to_string(),
            (false, Some(k)) => format!("betweenness:{k}"),
            (false, None) => "betweenness".to_string(),
        };
        self.cache.get_or_compute(&key, None, || {
            CentralityEngine::new(graph, &self.config).betweenness_centrality(options)
        })
    }
}

fn not_built() -> GraphEngineError {
    GraphEngineError::not_initialized("no graph has been built yet; run a build first")
}
