use crate::error::Result;
use crate::scanner::{FileScanner, ScanOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use structgraph_chunker::{Chunk, Chunker, TokenCounter};

/// Every scanned file's text in one serializable document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBundle {
    pub summary: BundleSummary,
    /// ASCII tree of the included files
    pub file_tree: String,
    /// Sorted by path
    pub files: Vec<BundleFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleSummary {
    pub root: String,
    pub file_count: usize,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleFile {
    /// Relative to the bundle root, `/`-separated
    pub path: String,
    pub size_bytes: u64,
    pub content: String,
}

impl TextBundle {
    /// Scan `root` and read every matching file
    pub fn collect(root: impl AsRef<Path>, options: ScanOptions) -> Result<Self> {
        let root = root.as_ref();
        let root_abs = root.canonicalize()?;
        let extensions = options.extensions.clone();

        let scanner = FileScanner::new(&root_abs, options);
        let mut files = Vec::new();
        for path in scanner.scan() {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("Failed to read {}: {err}; skipping", path.display());
                    continue;
                }
            };
            let relative = path.strip_prefix(&root_abs).unwrap_or(&path);
            files.push(BundleFile {
                path: relative.to_string_lossy().replace('\\', "/"),
                size_bytes: bytes.len() as u64,
                content: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let root_name = root_abs
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_abs.to_string_lossy().into_owned());
        let file_tree = render_tree(&root_name, files.iter().map(|f| f.path.as_str()));

        log::info!("Bundled {} file(s) from {}", files.len(), root_abs.display());
        Ok(Self {
            summary: BundleSummary {
                root: root_abs.to_string_lossy().into_owned(),
                file_count: files.len(),
                extensions,
            },
            file_tree,
            files,
        })
    }

    /// Write pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Raw-text chunks for every file, in bundle order
    pub fn split<T: TokenCounter>(&self, chunker: &Chunker<T>) -> Vec<Chunk> {
        chunker.chunk_files(self.files.iter().map(|f| (f.path.as_str(), f.content.as_str())))
    }
}

#[derive(Default)]
struct TreeDir<'a> {
    files: Vec<&'a str>,
    dirs: BTreeMap<&'a str, TreeDir<'a>>,
}

/// Render `/`-separated paths as an ASCII tree, files before subdirectories
fn render_tree<'a>(root_name: &str, paths: impl Iterator<Item = &'a str>) -> String {
    let mut top = TreeDir::default();
    for path in paths {
        let mut parts: Vec<&str> = path.split('/').collect();
        let Some(file) = parts.pop() else {
            continue;
        };
        let dir = parts
            .into_iter()
            .fold(&mut top, |dir, part| dir.dirs.entry(part).or_default());
        dir.files.push(file);
    }

    let mut lines = vec![root_name.to_string()];
    render_dir(&top, "", &mut lines);
    lines.join("\n")
}

fn render_dir(dir: &TreeDir<'_>, prefix: &str, lines: &mut Vec<String>) {
    let total = dir.files.len() + dir.dirs.len();
    let entries = dir
        .files
        .iter()
        .map(|f| (*f, None::<&TreeDir<'_>>))
        .chain(dir.dirs.iter().map(|(name, sub)| (*name, Some(sub))));

    for (i, (name, sub)) in entries.enumerate() {
        let last = i + 1 == total;
        let branch = if last { "└── " } else { "├── " };
        match sub {
            None => lines.push(format!("{prefix}{branch}{name}")),
            Some(sub) => {
                lines.push(format!("{prefix}{branch}{name}/"));
                let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
                render_dir(sub, &nested, lines);
            }
        }
    }
}
