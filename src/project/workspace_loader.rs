use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::base::FileId;
use crate::hir::AnalysisConfig;
use crate::ide::AnalysisHost;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk workspace: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to load {} file(s); the rest were loaded", .failures.len())]
    Partial { loaded: Vec<FileId>, failures: Vec<LoadError> },
}

/// Loads Java sources from disk into an [`AnalysisHost`].
///
/// Files are read in parallel; registering them with the host is
/// serial. Nothing is analysed until the caller runs
/// [`AnalysisHost::analyze`].
pub struct WorkspaceLoader {
    config: AnalysisConfig,
}

impl WorkspaceLoader {
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Pick up files with the extensions named in `config`.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Every source file under `dir`, sorted by path.
    pub fn collect_file_paths(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_owned()));
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && self.accepts(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    /// Load every source file under `dir`. Unreadable files are skipped
    /// and reported together in [`LoadError::Partial`].
    pub fn load_directory_into_host(
        &self,
        dir: impl AsRef<Path>,
        host: &mut AnalysisHost,
    ) -> Result<Vec<FileId>, LoadError> {
        let paths = self.collect_file_paths(dir.as_ref())?;
        let read: Vec<_> = paths
            .into_par_iter()
            .map(|path| {
                let text = fs::read_to_string(&path);
                (path, text)
            })
            .collect();

        let mut loaded = Vec::new();
        let mut failures = Vec::new();
        for (path, text) in read {
            match text {
                Ok(text) => loaded.push(host.set_file_content(&path, text)),
                Err(source) => {
                    warn!(path = %path.display(), error = %source, "failed to read source file");
                    failures.push(LoadError::Io { path, source });
                }
            }
        }
        debug!(loaded = loaded.len(), failed = failures.len(), "workspace loaded");

        if failures.is_empty() {
            Ok(loaded)
        } else {
            Err(LoadError::Partial { loaded, failures })
        }
    }

    /// Load a single file.
    pub fn load_file_into_host(&self, path: impl AsRef<Path>, host: &mut AnalysisHost) -> Result<FileId, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_owned(),
            source,
        })?;
        Ok(host.set_file_content(path, text))
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.accepts_extension(ext))
    }
}

impl Default for WorkspaceLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, text) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        dir
    }

    #[test]
    fn test_collects_only_java_sources() {
        let dir = workspace(&[
            ("a/A.java", "class A {}"),
            ("a/b/B.java", "class B {}"),
            ("README.md", "# readme"),
            ("a/A.class", ""),
        ]);
        let paths = WorkspaceLoader::new().collect_file_paths(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.java", "B.java"]);
    }

    #[test]
    fn test_custom_extensions() {
        let dir = workspace(&[("A.java", "class A {}"), ("B.jav", "class B {}")]);
        let loader = WorkspaceLoader::with_config(AnalysisConfig::new().with_extensions(["jav"]));
        assert_eq!(loader.collect_file_paths(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = WorkspaceLoader::new().collect_file_paths(&missing).unwrap_err();
        assert!(matches!(err, LoadError::NotADirectory(_)));
    }

    #[test]
    fn test_load_into_host() {
        let dir = workspace(&[("p/A.java", "package p; class A {}"), ("p/B.java", "package p; class B extends A {}")]);
        let mut host = AnalysisHost::new();
        let files = WorkspaceLoader::new()
            .load_directory_into_host(dir.path(), &mut host)
            .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(host.files().len(), 2);
        assert!(host.is_dirty());
    }

    #[test]
    fn test_load_single_file() {
        let dir = workspace(&[("A.java", "class A {}")]);
        let mut host = AnalysisHost::new();
        let file = WorkspaceLoader::new()
            .load_file_into_host(dir.path().join("A.java"), &mut host)
            .unwrap();
        assert_eq!(host.files().contents(file).as_deref(), Some("class A {}"));

        let err = WorkspaceLoader::new()
            .load_file_into_host(dir.path().join("Missing.java"), &mut host)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
