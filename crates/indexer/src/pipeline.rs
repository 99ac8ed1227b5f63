use crate::error::{IndexerError, Result};
use crate::scanner::{FileScanner, ScanOptions};
use std::path::Path;
use structgraph_graph::{BuildOutput, CodeGraph, GraphBuilder};

/// Scan `root` and build the code graph of every matching file.
/// Node paths are relative to `root`.
pub fn build_graph(root: impl AsRef<Path>, options: ScanOptions) -> Result<BuildOutput> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(IndexerError::InvalidPath(root.display().to_string()));
    }

    let files = FileScanner::new(root, options).scan();
    let mut builder = GraphBuilder::python(Some(root))?;
    Ok(builder.build_files(&files))
}

/// Persist the JSON document and, when asked, the NDJSON stream
pub fn write_graph_artifacts(
    graph: &CodeGraph,
    json_path: impl AsRef<Path>,
    ndjson_path: Option<&Path>,
) -> Result<()> {
    graph.save_json(json_path.as_ref())?;
    log::info!("Wrote {}", json_path.as_ref().display());

    if let Some(path) = ndjson_path {
        graph.save_ndjson(path)?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}
