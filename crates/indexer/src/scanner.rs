use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which files a scan picks up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Extensions without the dot, compared case-insensitively
    pub extensions: Vec<String>,

    /// Directory names pruned anywhere below the root
    pub excluded_dirs: Vec<String>,

    /// Files larger than this are skipped
    pub max_file_bytes: Option<u64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
            max_file_bytes: Some(MAX_FILE_SIZE_BYTES),
        }
    }
}

impl ScanOptions {
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn exclude_dir(mut self, name: impl Into<String>) -> Self {
        self.excluded_dirs.push(name.into());
        self
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

/// Scanner for finding source files in a project
pub struct FileScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>, options: ScanOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan directory for matching files (.gitignore aware), sorted by path
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let root = self.root.clone();
        let excluded = self.options.excluded_dirs.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // do not index hidden files by default
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(move |entry| !is_excluded_scope(entry.path(), &root, &excluded));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !self.options.matches_extension(path) {
                        continue;
                    }

                    if let (Some(limit), Ok(meta)) = (self.options.max_file_bytes, entry.metadata()) {
                        if meta.len() > limit {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {limit})",
                                path.display(),
                                meta.len()
                            );
                            continue;
                        }
                    }

                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("Found {} source files under {}", files.len(), self.root.display());
        files
    }
}

fn is_excluded_scope(path: &Path, root: &Path, excluded: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        std::path::Component::Normal(name) => {
            let name = name.to_string_lossy();
            excluded.iter().any(|ignored| ignored == name.as_ref())
        }
        _ => false,
    })
}

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "venv",
    ".venv",
    ".mypy_cache",
    ".pytest_cache",
    "node_modules",
];

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_python_files_sorted() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pkg")).unwrap();
        fs::write(temp.path().join("z.py"), b"pass\n").unwrap();
        fs::write(temp.path().join("pkg/a.py"), b"pass\n").unwrap();
        fs::write(temp.path().join("notes.md"), b"# notes\n").unwrap();

        let files = FileScanner::new(temp.path(), ScanOptions::default()).scan();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["pkg/a.py", "z.py"]);
    }

    #[test]
    fn skips_excluded_directories() {
        let temp = tempdir().unwrap();
        for dir in ["venv/lib", "__pycache__", "build"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
            fs::write(temp.path().join(dir).join("x.py"), b"pass\n").unwrap();
        }
        fs::write(temp.path().join("main.py"), b"pass\n").unwrap();

        let options = ScanOptions::default().exclude_dir("build");
        let files = FileScanner::new(temp.path(), options).scan();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.py"));
    }

    #[test]
    fn honours_extension_list_and_size_limit() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.PY"), b"pass\n").unwrap();
        fs::write(temp.path().join("b.pyi"), b"x: int\n").unwrap();
        fs::write(temp.path().join("big.py"), vec![b'#'; 64]).unwrap();

        let options = ScanOptions {
            max_file_bytes: Some(32),
            ..ScanOptions::default().with_extensions([".py", "pyi"])
        };
        let files = FileScanner::new(temp.path(), options).scan();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| !p.ends_with("big.py")));
    }
}
