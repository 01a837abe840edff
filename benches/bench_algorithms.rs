use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use talentgraph::{
    BetweennessOptions, EdgeRow, EngineConfig, Graph, GraphBuilder,
    algo::connected_components,
    bench_utils::{EdgeDataset, GraphShape, generate_graph},
    centrality::CentralityEngine,
    community::{CommunityAlgorithm, CommunityDetector},
    embedding::{EmbeddingEngine, EmbeddingTable},
    paths::{PathOptions, PathSampler},
};

const ER_SEED: u64 = 0x99AA;
const SF_SEED: u64 = 0x77CC;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

struct ReadyGraph {
    label: String,
    graph: Graph,
}

fn bench_scales() -> &'static [usize] {
    #[cfg(feature = "bench-ci")]
    {
        &[500, 2_000]
    }
    #[cfg(not(feature = "bench-ci"))]
    {
        &[1_000, 5_000, 10_000]
    }
}

fn scalefree_cases() -> Vec<ReadyGraph> {
    bench_scales()
        .iter()
        .map(|&nodes| {
            let dataset =
                generate_graph(GraphShape::ScaleFree { m: 3 }, nodes, SF_SEED + nodes as u64);
            ReadyGraph {
                label: format!("sf_{nodes}"),
                graph: materialize(dataset.rows),
            }
        })
        .collect()
}

fn materialize(rows: Vec<EdgeRow>) -> Graph {
    GraphBuilder::default()
        .build(rows, talentgraph::config::ABSOLUTE_MAX_NODES)
        .expect("graph")
        .graph
}

fn configure(group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
}

fn bench_components(c: &mut Criterion) {
    let nodes = bench_scales()[0];
    let dataset = generate_graph(
        GraphShape::RandomErdosRenyi {
            edges: nodes.saturating_mul(3),
        },
        nodes,
        ER_SEED,
    );
    let graph = materialize(dataset.rows);
    let mut group = c.benchmark_group("components");
    configure(&mut group);
    group.bench_function("random", |b| b.iter(|| connected_components(&graph)));
    group.finish();
}

fn bench_betweenness(c: &mut Criterion) {
    let cases = scalefree_cases();
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("betweenness");
    configure(&mut group);
    for case in &cases {
        group.bench_function(BenchmarkId::from_parameter(&case.label), |b| {
            b.iter(|| {
                CentralityEngine::new(&case.graph, &config)
                    .betweenness_centrality(BetweennessOptions::default())
                    .expect("betweenness")
            });
        });
    }
    group.finish();
}

fn bench_embeddings(c: &mut Criterion) {
    let cases = scalefree_cases();
    let mut group = c.benchmark_group("embeddings");
    configure(&mut group);
    for case in &cases {
        group.bench_function(BenchmarkId::from_parameter(&case.label), |b| {
            b.iter(|| EmbeddingTable::compute(&case.graph));
        });
        let table = EmbeddingTable::compute(&case.graph);
        let query = EdgeDataset::node_id(0);
        group.bench_function(BenchmarkId::new("similar_to", &case.label), |b| {
            b.iter(|| {
                EmbeddingEngine::new(&case.graph, &table)
                    .similar_to(&query, 10, 0.0)
                    .expect("similar")
            });
        });
    }
    group.finish();
}

fn bench_communities(c: &mut Criterion) {
    let nodes = bench_scales()[0];
    let dataset = generate_graph(GraphShape::Clustered { groups: 20 }, nodes, ER_SEED);
    let graph = materialize(dataset.rows);
    let detector = CommunityDetector::new(&EngineConfig::default());
    let mut group = c.benchmark_group("communities");
    configure(&mut group);
    for algorithm in [
        CommunityAlgorithm::GreedyModularity,
        CommunityAlgorithm::LabelPropagation,
        CommunityAlgorithm::Louvain,
    ] {
        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| detector.detect(&graph, algorithm));
        });
    }
    group.finish();
}

fn bench_paths(c: &mut Criterion) {
    let nodes = bench_scales()[0];
    let dataset = generate_graph(GraphShape::ScaleFree { m: 3 }, nodes, SF_SEED);
    let graph = materialize(dataset.rows);
    let table = EmbeddingTable::compute(&graph);
    let config = EngineConfig::default();
    let start = [EdgeDataset::node_id(nodes - 1)];
    let end = [EdgeDataset::node_id(nodes - 2)];
    let mut group = c.benchmark_group("paths");
    configure(&mut group);
    group.bench_function("scalefree_len4", |b| {
        b.iter(|| {
            PathSampler::new(&graph, &table, &config)
                .sample_paths(&start, &end, 4, PathOptions::default())
                .expect("paths")
        });
    });
    group.finish();
}

criterion_group!(
    name = algorithm_benches;
    config = Criterion::default();
    targets = bench_components, bench_betweenness, bench_embeddings, bench_communities, bench_paths
);
criterion_main!(algorithm_benches);
