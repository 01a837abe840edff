//! In-memory graph intelligence over professional collaboration networks.
//! Build a [`GraphEngine`] from collaboration and co-employment edges, then query
//! similarity, key connectors, communities and novelty-ranked bridge paths.
//! Run Criterion benchmarks with `cargo bench` to inspect reports under `target/criterion`.

pub mod algo;
pub mod bench_utils;
pub mod builder;
pub mod cache;
pub mod centrality;
pub mod client;
pub mod community;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod export;
pub mod graph;
pub mod paths;
pub mod rows;
pub mod schema;
pub mod source;
pub mod stats;

pub use crate::builder::{BuildReport, GraphBuilder};
pub use crate::centrality::{BetweennessOptions, CentralityRanking, NodeScore};
pub use crate::community::{CommunityAlgorithm, Partition};
pub use crate::config::EngineConfig;
pub use crate::engine::{EdgeSpec, EngineStatus, GraphEngine, MutationAck};
pub use crate::errors::GraphEngineError;
pub use crate::export::ExportFormat;
pub use crate::graph::{Graph, Node, NodeKind};
pub use crate::paths::{PathOptions, PathSamplingResult, RankedPath};
pub use crate::rows::{EdgeRow, EdgeType, RawEdgeRow};
pub use crate::source::{EdgeSource, SqliteEdgeSource};
pub use crate::stats::{GraphStats, StatsOptions};
