use assert_cmd::Command;
use talentgraph::{EdgeRow, SqliteEdgeSource};
use tempfile::TempDir;

fn contains(stdout: &[u8], needle: &str) -> bool {
    String::from_utf8_lossy(stdout).contains(needle)
}

fn prepare_db(dir: &TempDir) -> String {
    let path = dir.path().join("talent.db");
    let source = SqliteEdgeSource::open(&path).expect("source");
    for row in [
        EdgeRow::collaboration("A", "B", 0.9),
        EdgeRow::collaboration("A", "C", 0.8),
        EdgeRow::collaboration("B", "C", 0.7),
        EdgeRow::co_employment("D", "E", 1.0),
    ] {
        source.insert(&row).expect("insert");
    }
    path.to_string_lossy().into_owned()
}

fn talentgraph() -> Command {
    Command::new(env!("CARGO_BIN_EXE_talentgraph"))
}

#[test]
fn test_cli_exits_with_success_on_help() {
    talentgraph().arg("--help").assert().success();
}

#[test]
fn test_cli_status_without_database_reports_not_built() {
    let output = talentgraph().arg("status").output().unwrap();
    assert!(output.status.success());
    assert!(contains(&output.stdout, "not_built"));
}

#[test]
fn test_cli_stats_command_with_db() {
    let dir = TempDir::new().unwrap();
    let db = prepare_db(&dir);
    let output = talentgraph().args(["--db", &db, "stats"]).output().unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["node_count"], 5);
    assert_eq!(stats["component_count"], 2);
}

#[test]
fn test_cli_similar_and_paths() {
    let dir = TempDir::new().unwrap();
    let db = prepare_db(&dir);
    let output = talentgraph()
        .args(["--db", &db, "similar", "--node", "A", "--top-k", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["similar"][0]["node_id"], "B");

    let output = talentgraph()
        .args(["--db", &db, "paths", "--from", "A", "--to", "B", "--max-length", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["paths"].as_array().unwrap().len(), 2);
    assert_eq!(doc["truncated"], false);
}

#[test]
fn test_cli_export_graphml() {
    let dir = TempDir::new().unwrap();
    let db = prepare_db(&dir);
    let output = talentgraph()
        .args(["--db", &db, "export", "--format", "graphml"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(contains(&output.stdout, "<graphml"));
}

#[test]
fn test_cli_usage_error_exits_two() {
    talentgraph().args(["similar"]).assert().code(2);
    talentgraph().args(["teleport"]).assert().code(2);
}

#[test]
fn test_cli_invalid_node_limit_rejected_without_db() {
    talentgraph()
        .args(["--node-limit", "0", "status"])
        .assert()
        .code(2);
    talentgraph()
        .args(["--node-limit", "50001", "status"])
        .assert()
        .code(2);
    talentgraph()
        .args(["--node-limit", "100", "status"])
        .assert()
        .success();
}

#[test]
fn test_cli_command_failure_exits_one() {
    let dir = TempDir::new().unwrap();
    let db = prepare_db(&dir);
    talentgraph()
        .args(["--db", &db, "similar", "--node", "nobody"])
        .assert()
        .code(1);
    talentgraph().args(["communities"]).assert().code(1);
}
