//! The set of compilation units being analysed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::base::FileId;

#[derive(Clone, Debug)]
struct SourceFile {
    path: PathBuf,
    text: Option<Arc<str>>,
}

#[derive(Debug, Default)]
struct Sources {
    by_path: FxHashMap<PathBuf, FileId>,
    files: IndexMap<FileId, SourceFile>,
}

/// Assigns stable [`FileId`]s to paths and holds each file's text.
///
/// Ids are handed out in first-seen order and never reused, so a path
/// keeps its id when its text is replaced.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<Sources>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the id for a path.
    pub fn file_id(&self, path: &Path) -> FileId {
        if let Some(id) = self.lookup(path) {
            return id;
        }
        let mut inner = self.inner.write();
        // Another writer may have registered it in between.
        if let Some(&id) = inner.by_path.get(path) {
            return id;
        }
        let id = FileId::new(inner.files.len() as u32);
        inner.by_path.insert(path.to_owned(), id);
        inner.files.insert(
            id,
            SourceFile {
                path: path.to_owned(),
                text: None,
            },
        );
        id
    }

    /// Id of a path that has already been registered.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.inner.read().by_path.get(path).copied()
    }

    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().files.get(&file).map(|f| f.path.clone())
    }

    /// Replace the text of a registered file. Unknown ids are ignored.
    pub fn set_contents(&self, file: FileId, contents: impl Into<Arc<str>>) {
        if let Some(source) = self.inner.write().files.get_mut(&file) {
            source.text = Some(contents.into());
        }
    }

    pub fn contents(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().files.get(&file).and_then(|f| f.text.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All file ids, in registration order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().files.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_per_path() {
        let files = FileSet::new();

        let a = files.file_id(Path::new("/src/A.java"));
        let b = files.file_id(Path::new("/src/B.java"));
        assert_ne!(a, b);
        assert_eq!(files.file_id(Path::new("/src/A.java")), a);
        assert_eq!(files.files(), vec![a, b]);
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_contents_are_replaced() {
        let files = FileSet::new();
        let id = files.file_id(Path::new("/src/Test.java"));

        assert!(files.contents(id).is_none());
        files.set_contents(id, "class Test {}");
        files.set_contents(id, "class Test { int x; }");
        assert_eq!(files.contents(id).as_deref(), Some("class Test { int x; }"));
    }

    #[test]
    fn test_unregistered_ids_hold_nothing() {
        let files = FileSet::new();
        files.set_contents(FileId::new(4), "class Lost {}");
        assert!(files.contents(FileId::new(4)).is_none());
        assert!(files.is_empty());
    }

    #[test]
    fn test_path_lookup() {
        let files = FileSet::new();
        let path = Path::new("/src/Test.java");
        let id = files.file_id(path);

        assert_eq!(files.path(id).as_deref(), Some(path));
        assert_eq!(files.lookup(path), Some(id));
        assert_eq!(files.lookup(Path::new("/src/Other.java")), None);
    }
}
