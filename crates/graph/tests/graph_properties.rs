use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap};
use structgraph_graph::{BuildOutput, CodeGraph, EdgeType, GraphBuilder, NodeKind};

fn build(files: &[(&str, &str)]) -> BuildOutput {
    let mut builder = GraphBuilder::python(None).expect("python provider");
    builder.build_sources(
        files
            .iter()
            .map(|(path, code)| (path.to_string(), code.as_bytes().to_vec()))
            .collect(),
    )
}

const SERVICE: &str = r#"import os
from typing import List


class Repo:
    """Storage facade."""

    def __init__(self, root):
        self.root = root

    @staticmethod
    def load(path):
        with open(path) as fh:
            return fh.read()


def helper(items: List[str]):
    total = 0
    for item in items:
        if item:
            total += len(item)
    while total > 10:
        total -= 1
    try:
        os.getcwd()
    except OSError:
        pass
    return total


def main():
    repo = Repo("/tmp")
    helper([repo.root])
"#;

#[test]
fn every_non_module_node_has_exactly_one_owner() {
    let out = build(&[("service.py", SERVICE), ("util.py", "def f():\n    g()\n")]);

    let mut incoming: HashMap<usize, usize> = HashMap::new();
    for edge in out.graph.edges().filter(|e| e.edge_type == EdgeType::Contains) {
        *incoming.entry(edge.target).or_default() += 1;
    }

    for node in out.graph.nodes() {
        let owners = incoming.get(&node.id).copied().unwrap_or(0);
        if node.kind == NodeKind::Module {
            assert_eq!(owners, 0, "module {} must be a root", node.display_name());
        } else {
            assert_eq!(owners, 1, "{} {} owners", node.kind, node.display_name());
            assert_eq!(node.parent_id, out.graph.parent(node.id));
        }
    }
}

#[test]
fn service_fixture_has_expected_structure() {
    let out = build(&[("service.py", SERVICE)]);
    let graph = &out.graph;

    let kinds: BTreeSet<NodeKind> = graph.nodes().map(|n| n.kind).collect();
    for kind in [
        NodeKind::Module,
        NodeKind::Class,
        NodeKind::Method,
        NodeKind::Function,
        NodeKind::If,
        NodeKind::For,
        NodeKind::While,
        NodeKind::Try,
        NodeKind::With,
        NodeKind::Assignment,
        NodeKind::Decorator,
        NodeKind::Docstring,
        NodeKind::Import,
        NodeKind::ExternalFunction,
    ] {
        assert!(kinds.contains(&kind), "missing {kind}");
    }

    let load = &graph.find_by_qualified_name("service.Repo.load")[0];
    assert_eq!(load.kind, NodeKind::Method);
    assert_eq!(load.signature.as_deref(), Some("load(path)"));
    assert_eq!((load.start_line, load.end_line), (Some(12), Some(14)));

    let repo = &graph.find_by_qualified_name("service.Repo")[0];
    assert_eq!(repo.docstring.as_deref(), Some("\"\"\"Storage facade.\"\"\""));
    assert_eq!(repo.module.as_deref(), Some("service.py"));

    let main = graph.find_by_qualified_name("service.main")[0].id;
    let callees: BTreeSet<String> = graph
        .callees(main)
        .into_iter()
        .map(|id| graph.node(id).unwrap().display_name().to_string())
        .collect();
    assert!(callees.contains("service.Repo"), "{callees:?}");
    assert!(callees.contains("service.helper"), "{callees:?}");
}

#[test]
fn top_level_function_then_method() {
    let out = build(&[("module.py", "def f(): pass\n")]);
    let defs: Vec<_> = out
        .graph
        .nodes()
        .filter(|n| n.kind != NodeKind::Module)
        .collect();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].kind, NodeKind::Function);
    assert_eq!(defs[0].qualified_name.as_deref(), Some("module.f"));

    let out = build(&[("module.py", "class C:\n    def f(): pass\n")]);
    let f = out
        .graph
        .nodes()
        .find(|n| n.name.as_deref() == Some("f"))
        .unwrap();
    assert_eq!(f.kind, NodeKind::Method);
    assert_eq!(f.qualified_name.as_deref(), Some("module.C.f"));
}

#[test]
fn duplicate_qualified_names_keep_last_registrant() {
    let code = "def outer():\n    if a:\n        def dup():\n            return 1\n    else:\n        def dup():\n            return 2\n";
    let out = build(&[("m.py", code)]);

    let dups: Vec<usize> = out
        .graph
        .find_by_qualified_name("m.outer.dup")
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(dups.len(), 2);
    assert!(dups[0] < dups[1]);
    assert_eq!(out.symbols.get("m.outer.dup"), Some(dups[1]));
    assert_eq!(out.stats.symbol_collisions, 1);
}

#[test]
fn sid_is_stable_and_code_sha_tracks_body() {
    let original = "def compute(x):\n    return x + 1\n";
    let edited = "def compute(x):\n    return x + 2\n";
    let renamed = "def calculate(x):\n    return x + 1\n";

    let first = build(&[("calc.py", original)]);
    let again = build(&[("calc.py", original)]);
    let sids = |out: &BuildOutput| -> Vec<String> { out.graph.nodes().map(|n| n.sid.clone()).collect() };
    assert_eq!(sids(&first), sids(&again));

    let func = |out: &BuildOutput| {
        out.graph
            .nodes()
            .find(|n| n.kind == NodeKind::Function)
            .cloned()
            .unwrap()
    };

    let base = func(&first);
    let body_edit = func(&build(&[("calc.py", edited)]));
    assert_eq!(base.sid, body_edit.sid);
    assert_ne!(base.code_sha, body_edit.code_sha);

    let rename = func(&build(&[("calc.py", renamed)]));
    assert_ne!(base.sid, rename.sid);
}

#[test]
fn undefined_helper_dedups_per_module() {
    let code = "def a():\n    helper()\n\ndef b():\n    helper()\n";
    let out = build(&[("m.py", code), ("n.py", "def c():\n    helper()\n")]);

    let externals: Vec<_> = out
        .graph
        .nodes()
        .filter(|n| n.kind == NodeKind::ExternalFunction && n.name.as_deref() == Some("helper"))
        .collect();
    // One stand-in per module, shared by every call site in that module
    assert_eq!(externals.len(), 2);

    let in_m = externals.iter().find(|n| n.path.as_deref() == Some("m.py")).unwrap();
    assert_eq!(out.graph.callers(in_m.id).len(), 2);
    assert!(in_m.code.is_none());
    assert!(in_m.code_sha.is_none());
    assert!(in_m.start_line.is_none());
}

#[test]
fn json_round_trip_preserves_graph() {
    let out = build(&[("service.py", SERVICE)]);

    let mut buf = Vec::new();
    out.graph.write_json(&mut buf).unwrap();
    let loaded = CodeGraph::read_json(buf.as_slice()).unwrap();

    assert_eq!(loaded.node_count(), out.graph.node_count());
    assert_eq!(loaded.edge_count(), out.graph.edge_count());
    let sids = |g: &CodeGraph| -> BTreeSet<String> { g.nodes().map(|n| n.sid.clone()).collect() };
    assert_eq!(sids(&loaded), sids(&out.graph));
    assert_eq!(loaded.to_document().nodes, out.graph.to_document().nodes);
    assert_eq!(loaded.to_document().edges, out.graph.to_document().edges);
}

#[test]
fn ndjson_matches_json_form() {
    let out = build(&[("service.py", SERVICE)]);

    let mut stream = Vec::new();
    out.graph.write_ndjson(&mut stream).unwrap();
    let records = String::from_utf8(stream.clone())
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .count();
    assert_eq!(records, out.graph.node_count() + out.graph.edge_count());

    let from_stream = CodeGraph::read_ndjson(stream.as_slice()).unwrap();
    assert_eq!(from_stream.to_document().nodes, out.graph.to_document().nodes);
    assert_eq!(from_stream.to_document().edges, out.graph.to_document().edges);
}

#[test]
fn artifacts_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = build(&[("service.py", SERVICE)]);

    let json = dir.path().join("graphs/graph.json");
    let ndjson = dir.path().join("graphs/graph.ndjson");
    out.graph.save_json(&json).unwrap();
    out.graph.save_ndjson(&ndjson).unwrap();

    let a = CodeGraph::load_json(&json).unwrap();
    let b = CodeGraph::load_ndjson(&ndjson).unwrap();
    assert_eq!(a.to_document().nodes, b.to_document().nodes);
    assert_eq!(a.edge_count(), b.edge_count());
}
