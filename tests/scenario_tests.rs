use serde_json::json;
use talentgraph::{
    BetweennessOptions, CommunityAlgorithm, EdgeRow, EdgeSpec, EdgeType, EngineStatus,
    GraphEngine, GraphEngineError, PathOptions, StatsOptions,
};

fn scenario_rows() -> Vec<EdgeRow> {
    vec![
        EdgeRow::collaboration("A", "B", 0.9),
        EdgeRow::collaboration("A", "C", 0.8),
        EdgeRow::collaboration("B", "C", 0.7),
        EdgeRow::collaboration("D", "E", 1.0),
    ]
}

fn built_engine() -> GraphEngine {
    let engine = GraphEngine::default();
    engine.build(scenario_rows(), None).expect("build");
    engine
}

#[test]
fn test_stats_for_triangle_and_pair() {
    let engine = built_engine();
    let stats = engine.stats(StatsOptions::default()).unwrap();
    assert_eq!(stats.node_count, 5);
    assert_eq!(stats.edge_count, 4);
    assert_eq!(stats.component_count, 2);
    assert!(!stats.is_connected);
    assert!(stats.betweenness_stats.is_none());
    assert!((stats.density - 0.4).abs() < 1e-12);
    assert!((stats.avg_clustering - 0.6).abs() < 1e-12);
}

#[test]
fn test_similar_to_ranks_triangle_members_first() {
    let engine = built_engine();
    let similar = engine.similar_people("A", 2, 0.0).unwrap();
    let ids: Vec<&str> = similar.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C"]);

    let all = engine.similar_people("A", 10, 0.0).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|s| s.node_id != "A"));
    let score = |id: &str| all.iter().find(|s| s.node_id == id).unwrap().similarity;
    assert!(score("B") > score("D"));
    assert!(score("C") > score("E"));
}

#[test]
fn test_add_edge_merges_components() {
    let engine = built_engine();
    assert_eq!(
        engine
            .stats(StatsOptions::default())
            .unwrap()
            .component_count,
        2
    );
    let ack = engine.add_edge(EdgeSpec::new("A", "D", 0.5)).unwrap();
    assert!(ack.created);
    assert_eq!(ack.node_count, 5);
    assert_eq!(ack.edge_count, 5);
    let stats = engine.stats(StatsOptions::default()).unwrap();
    assert_eq!(stats.component_count, 1);
    assert!(stats.is_connected);
}

#[test]
fn test_chain_interior_outranks_endpoints() {
    let rows: Vec<EdgeRow> = (0..9)
        .map(|i| EdgeRow::collaboration(&format!("n{i}"), &format!("n{}", i + 1), 1.0))
        .collect();
    let engine = GraphEngine::default();
    engine.build(rows, None).unwrap();
    let ranking = engine.betweenness(BetweennessOptions::default()).unwrap();
    assert!(!ranking.approximate);
    let ends = ranking.score_of("n0").unwrap().max(ranking.score_of("n9").unwrap());
    assert_eq!(ends, 0.0);
    for i in 1..9 {
        assert!(ranking.score_of(&format!("n{i}")).unwrap() > ends);
    }
    let top = &ranking.scores[0];
    assert!(top.node_id == "n4" || top.node_id == "n5");

    let connectors = engine.key_connectors(2).unwrap();
    let ids: Vec<&str> = connectors
        .connectors
        .iter()
        .map(|c| c.node_id.as_str())
        .collect();
    assert_eq!(ids, vec!["n4", "n5"]);
}

#[test]
fn test_queries_before_build_are_distinct_from_empty_graph() {
    let engine = GraphEngine::default();
    assert!(matches!(
        engine.similar_people("A", 2, 0.0),
        Err(GraphEngineError::NotInitialized(_))
    ));
    assert!(matches!(
        engine.communities(CommunityAlgorithm::GreedyModularity),
        Err(GraphEngineError::NotInitialized(_))
    ));

    engine.build(Vec::new(), None).unwrap();
    let stats = engine.stats(StatsOptions::default()).unwrap();
    assert_eq!(stats.node_count, 0);
    assert!(!stats.is_connected);
    assert!(matches!(
        engine.similar_people("A", 2, 0.0),
        Err(GraphEngineError::NotFound(_))
    ));
}

#[test]
fn test_failed_rebuild_keeps_previous_graph() {
    let engine = built_engine();
    let bad = vec![
        EdgeRow::collaboration("X", "Y", 0.4),
        EdgeRow::collaboration("Y", "Z", 1.7),
    ];
    assert!(matches!(
        engine.build(bad, None),
        Err(GraphEngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.build(scenario_rows(), Some(0)),
        Err(GraphEngineError::Configuration(_))
    ));
    assert!(matches!(
        engine.build(scenario_rows(), Some(50_001)),
        Err(GraphEngineError::Configuration(_))
    ));
    assert_eq!(
        engine.status(),
        EngineStatus::Built {
            node_count: 5,
            edge_count: 4,
            generation: 1
        }
    );
    assert_eq!(engine.similar_people("A", 1, 0.0).unwrap()[0].node_id, "B");
}

#[test]
fn test_add_edge_rules() {
    let engine = built_engine();
    assert!(matches!(
        engine.add_edge(EdgeSpec::new("A", "Q", 0.5)),
        Err(GraphEngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.add_edge(EdgeSpec::new("A", "A", 0.5)),
        Err(GraphEngineError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.add_edge(EdgeSpec::new("A", "B", 1.5)),
        Err(GraphEngineError::InvalidInput(_))
    ));

    let ack = engine
        .add_edge(EdgeSpec::new("A", "Q", 0.5).create_missing(true))
        .unwrap();
    assert_eq!(ack.nodes_created, 1);
    assert_eq!(ack.node_count, 6);

    let ack = engine.add_edge(EdgeSpec::new("B", "A", 0.1)).unwrap();
    assert!(!ack.created);
    assert_eq!(ack.edge_count, 5);

    let ack = engine
        .add_edge(EdgeSpec::new("B", "A", 0.3).edge_type(EdgeType::CoEmployment))
        .unwrap();
    assert!(ack.created);
    assert_eq!(ack.edge_count, 6);
}

#[test]
fn test_add_person_rejects_duplicates() {
    let engine = built_engine();
    let ack = engine
        .add_person("F", json!({ "title": "staff engineer" }))
        .unwrap();
    assert_eq!(ack.node_count, 6);
    assert_eq!(ack.edge_count, 4);
    assert!(matches!(
        engine.add_person("F", json!({})),
        Err(GraphEngineError::InvalidInput(_))
    ));
    let stats = engine.stats(StatsOptions::default()).unwrap();
    assert_eq!(stats.component_count, 3);
}

#[test]
fn test_path_sampling_boundaries() {
    let engine = built_engine();
    let same = engine
        .path_sampling(&["A"], &["A"], 3, PathOptions::default())
        .unwrap();
    assert!(same.paths.is_empty());

    let disconnected = engine
        .path_sampling(&["A"], &["E"], 6, PathOptions::default())
        .unwrap();
    assert!(disconnected.paths.is_empty());
    assert!(!disconnected.truncated);

    assert!(matches!(
        engine.path_sampling(&["A"], &["ghost"], 3, PathOptions::default()),
        Err(GraphEngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.path_sampling(&["A"], &["B"], 0, PathOptions::default()),
        Err(GraphEngineError::Configuration(_))
    ));

    let direct = engine
        .path_sampling(&["A"], &["B"], 2, PathOptions::default())
        .unwrap();
    let paths: Vec<Vec<String>> = direct.paths.iter().map(|p| p.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            vec!["A".to_string(), "B".to_string()],
            vec!["A".to_string(), "C".to_string(), "B".to_string()],
        ]
    );
}

#[test]
fn test_betweenness_only_with_explicit_option() {
    let engine = built_engine();
    let plain = engine.stats(StatsOptions::default()).unwrap();
    assert!(plain.betweenness_stats.is_none());
    let full = engine
        .stats(StatsOptions {
            include_betweenness: true,
        })
        .unwrap();
    let betweenness = full.betweenness_stats.unwrap();
    assert!(!betweenness.approximate);
    assert_eq!(betweenness.max, 0.0);
}
