use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn cli() -> Command {
    Command::cargo_bin("structgraph").expect("binary")
}

fn write_project(root: &Path) {
    fs::create_dir_all(root.join("pkg")).unwrap();
    fs::write(
        root.join("pkg/util.py"),
        "def helper(x):\n    return len(x)\n",
    )
    .unwrap();
    fs::write(
        root.join("main.py"),
        "import pkg.util\n\n\ndef run():\n    helper([1, 2])\n\n\ndef helper(v):\n    return v\n",
    )
    .unwrap();
}

fn stdout_json(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn graph_command_writes_json_and_ndjson() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("project");
    write_project(&project);
    let json = temp.path().join("out/graph.json");
    let ndjson = temp.path().join("out/graph.ndjson");

    cli()
        .arg("graph")
        .arg(&project)
        .arg("--out")
        .arg(&json)
        .arg("--ndjson")
        .arg(&ndjson)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let doc: Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    let nodes = doc["nodes"].as_array().unwrap();
    assert!(nodes.iter().any(|n| n["qualified_name"] == "main.run"));
    assert!(nodes.iter().any(|n| n["path"] == "pkg/util.py"));
    assert!(doc["edges"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["type"] == "CALLS"));

    let stream = fs::read_to_string(&ndjson).unwrap();
    let first: Value = serde_json::from_str(stream.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "node");
}

#[test]
fn chunk_graph_prints_chunks() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("project");
    write_project(&project);
    let json = temp.path().join("graph.json");

    cli()
        .args(["-q", "graph"])
        .arg(&project)
        .arg("--out")
        .arg(&json)
        .assert()
        .success();

    let output = cli()
        .args(["-q", "chunk-graph"])
        .arg(&json)
        .args(["--budget", "60"])
        .output()
        .unwrap();
    let chunks = stdout_json(&output);
    let chunks = chunks.as_array().unwrap();
    assert!(!chunks.is_empty());

    let files: Vec<&str> = chunks.iter().map(|c| c["file"].as_str().unwrap()).collect();
    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(files, sorted);
    assert!(chunks.iter().all(|c| c["content"].as_str().unwrap().contains("\n---\n")));
}

#[test]
fn bundle_then_chunk_text() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("project");
    write_project(&project);
    let bundle = temp.path().join("bundle.json");

    cli()
        .args(["-q", "bundle"])
        .arg(&project)
        .arg("--out")
        .arg(&bundle)
        .assert()
        .success();

    let output = cli()
        .args(["-q", "chunk-text"])
        .arg(&bundle)
        .args(["--budget", "500", "--overlap", "10"])
        .output()
        .unwrap();
    let chunks = stdout_json(&output);
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0]["file"], "main.py");
    assert_eq!(chunks[0]["start_line"], 1);
    assert_eq!(chunks[0]["end_line"], 9);
}

#[test]
fn chunk_text_rejects_overlap_not_below_budget() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("project");
    write_project(&project);
    let bundle = temp.path().join("bundle.json");

    cli().arg("bundle").arg(&project).arg("--out").arg(&bundle).assert().success();

    cli()
        .arg("chunk-text")
        .arg(&bundle)
        .args(["--budget", "10", "--overlap", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlap_tokens"));
}

#[test]
fn diff_reports_added_function() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("project");
    write_project(&project);
    let old = temp.path().join("old.json");
    let new = temp.path().join("new.json");

    cli().args(["-q", "graph"]).arg(&project).arg("--out").arg(&old).assert().success();
    fs::write(
        project.join("pkg/util.py"),
        "def helper(x):\n    return len(x)\n\n\ndef extra():\n    pass\n",
    )
    .unwrap();
    cli().args(["-q", "graph"]).arg(&project).arg("--out").arg(&new).assert().success();

    let output = cli().args(["-q", "diff"]).arg(&old).arg(&new).output().unwrap();
    let diff = stdout_json(&output);
    let added: Vec<&str> = diff["added"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["qualified_name"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(added, vec!["util.extra"]);
    assert!(diff["removed"].as_array().unwrap().is_empty());
}
