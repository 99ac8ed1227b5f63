use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;
use structgraph_graph::CodeGraph;

#[derive(Copy, Clone, Default, ValueEnum)]
pub(crate) enum GraphFormatFlag {
    /// Pick by file extension (`.ndjson` / `.jsonl` read as a stream)
    #[default]
    Auto,
    Json,
    Ndjson,
}

impl GraphFormatFlag {
    fn resolve(self, path: &Path) -> Self {
        match self {
            GraphFormatFlag::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some("ndjson" | "jsonl") => GraphFormatFlag::Ndjson,
                _ => GraphFormatFlag::Json,
            },
            explicit => explicit,
        }
    }

    pub(crate) fn load(self, path: &Path) -> Result<CodeGraph> {
        let graph = match self.resolve(path) {
            GraphFormatFlag::Ndjson => CodeGraph::load_ndjson(path),
            _ => CodeGraph::load_json(path),
        };
        graph.with_context(|| format!("Failed to load graph from {}", path.display()))
    }
}
