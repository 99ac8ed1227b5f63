use crate::error::Result;
use crate::registrar::Registrar;
use crate::resolver::BuildOutput;
use crate::syntax::{PythonTreeProvider, SyntaxTreeProvider};
use std::path::{Path, PathBuf};

/// Build a code graph from source files
///
/// Every file runs pass 1 before any file runs pass 2, and files are
/// registered in lexical path order so symbol collisions resolve the same way
/// on every run.
pub struct GraphBuilder<P: SyntaxTreeProvider = PythonTreeProvider> {
    provider: P,
    root: Option<PathBuf>,
}

impl GraphBuilder<PythonTreeProvider> {
    /// Python builder; node paths are made relative to `root` when given
    pub fn python(root: Option<&Path>) -> Result<Self> {
        Ok(Self::with_provider(PythonTreeProvider::new()?, root))
    }
}

impl<P: SyntaxTreeProvider> GraphBuilder<P> {
    pub fn with_provider(provider: P, root: Option<&Path>) -> Self {
        Self {
            provider,
            root: root.map(Path::to_path_buf),
        }
    }

    /// Read and build a set of files; unreadable files are logged and skipped
    pub fn build_files(&mut self, files: &[PathBuf]) -> BuildOutput {
        let mut sorted: Vec<&PathBuf> = files.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut skipped = 0;
        let mut sources = Vec::with_capacity(sorted.len());
        for path in sorted {
            match std::fs::read(path) {
                Ok(bytes) => sources.push((self.display_path(path), bytes)),
                Err(err) => {
                    log::warn!("Failed to read {}: {err}; skipping", path.display());
                    skipped += 1;
                }
            }
        }

        let mut output = self.build_sources(sources);
        output.stats.skipped_files += skipped;
        output
    }

    /// Build from in-memory `(path, bytes)` pairs
    pub fn build_sources(&mut self, mut sources: Vec<(String, Vec<u8>)>) -> BuildOutput {
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let mut registrar = Registrar::new();
        for (path, bytes) in sources {
            registrar.register_file(&mut self.provider, &path, bytes);
        }
        registrar.finish().resolve()
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok());
        match relative {
            Some(rel) => rel.to_string_lossy().replace('\\', "/"),
            None => path.to_string_lossy().into_owned(),
        }
    }
}
