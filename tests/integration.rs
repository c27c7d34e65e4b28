use std::fs;
use std::process::Command;

use serde_json::Value;

const GRAPH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/graph.json");
const BINDINGS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bindings.yaml");
const INVALID_BINDINGS: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid_bindings.yaml");

fn node<'a>(document: &'a Value, id: &str) -> &'a Value {
    document["nodes"]
        .as_array()
        .expect("nodes should be an array")
        .iter()
        .find(|n| n["id"] == id)
        .unwrap_or_else(|| panic!("Missing node {}", id))
}

#[test]
fn renders_fixture_graph_with_bindings() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let output = dir.path().join("rendered.json");

    let status = Command::new(env!("CARGO_BIN_EXE_graphbind"))
        .args([
            "render",
            "--graph",
            GRAPH,
            "--config",
            BINDINGS,
            "--output",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to execute graphbind");

    assert!(status.success(), "graphbind exited with error");

    let content = fs::read_to_string(&output).expect("Failed to read rendered.json");
    let document: Value = serde_json::from_str(&content).expect("Output should be JSON");

    assert_eq!(document["layout"], "hierarchic");
    assert_eq!(document["format_version"], "1.0");

    // four query nodes plus two department groups
    assert_eq!(document["nodes"].as_array().unwrap().len(), 6);
    assert_eq!(node(&document, "GroupNodeEngineering")["label"], "Engineering");
    assert_eq!(node(&document, "GroupNodeSales")["label"], "Sales");

    // REPORTS_TO is folded: alice nests under carol instead of her department
    assert_eq!(node(&document, "alice")["parent"], "carol");
    assert_eq!(node(&document, "carol")["parent"], "GroupNodeEngineering");
    assert_eq!(node(&document, "bob")["parent"], "GroupNodeSales");

    assert_eq!(node(&document, "alice")["label"], "Alice");
    assert_eq!(node(&document, "alice")["heat"], 0.8);
    assert_eq!(node(&document, "alice")["scale_factor"], 1.5);
    assert_eq!(node(&document, "acme")["label"], "Acme Corp");
    assert_eq!(node(&document, "acme")["color"], "#E67E22");

    let edges = document["edges"].as_array().unwrap();
    let ids: Vec<&str> = edges.iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["k1", "w1"]);
    assert_eq!(edges[0]["label"], 2019);
    assert_eq!(edges[0]["thickness_factor"], 3);
}

#[test]
fn layout_flag_overrides_bindings_document() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rendered.json");

    let status = Command::new(env!("CARGO_BIN_EXE_graphbind"))
        .args([
            "render",
            "--graph",
            GRAPH,
            "--config",
            BINDINGS,
            "--layout",
            "circular",
            "--output",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("Failed to execute graphbind");

    assert!(status.success());
    let document: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(document["layout"], "circular");
}

#[test]
fn renders_without_bindings_document() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("rendered.json");

    let status = Command::new(env!("CARGO_BIN_EXE_graphbind"))
        .args(["render", "--graph", GRAPH, "--output", output.to_str().unwrap()])
        .status()
        .expect("Failed to execute graphbind");

    assert!(status.success());
    let document: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(document["layout"], "organic");
    assert_eq!(document["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(document["edges"].as_array().unwrap().len(), 3);
    assert_eq!(node(&document, "bob")["label"], "Bob");
}

#[test]
fn check_accepts_valid_bindings() {
    let output = Command::new(env!("CARGO_BIN_EXE_graphbind"))
        .args(["check", "--config", BINDINGS])
        .output()
        .expect("Failed to execute graphbind");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 node and 1 relationship configurations"));
}

#[test]
fn check_rejects_unknown_layout() {
    let output = Command::new(env!("CARGO_BIN_EXE_graphbind"))
        .args(["check", "--config", INVALID_BINDINGS])
        .output()
        .expect("Failed to execute graphbind");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown graph layout: spiral"), "stderr: {}", stderr);
}
