//! Document storage.
//!
//! All corpus filesystem access happens here; handlers only ever see
//! filenames and typed results. A name that could escape the corpus
//! directory (separators, `..`) cannot name a stored document, so those
//! uniformly report `NotFound`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} does not exist.")]
    NotFound(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat directory of documents, keyed by filename.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
            || name == "."
        {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Filenames in directory order. No sorting promise.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.entry_path(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io(e),
        })
    }

    /// Create or overwrite. Last writer wins; no atomicity beyond the
    /// single write call.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.entry_path(name)?;
        fs::write(&path, bytes)?;
        tracing::debug!(name, size = bytes.len(), "document written");
        Ok(())
    }

    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.entry_path(name)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            _ => StoreError::Io(e),
        })?;
        tracing::debug!(name, "document deleted");
        Ok(())
    }

    /// Copy `source` to `dest`. The caller validates `dest` first.
    pub fn duplicate(&self, source: &str, dest: &str) -> Result<(), StoreError> {
        let bytes = self.read(source)?;
        self.write(dest, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, DocumentStore) {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path());
        (tmp, store)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_tmp, store) = test_store();

        store.write("about.txt", b"hello corpus").unwrap();
        assert_eq!(store.read("about.txt").unwrap(), b"hello corpus");
    }

    #[test]
    fn written_document_appears_in_list() {
        let (_tmp, store) = test_store();

        store.write("history.md", b"# History").unwrap();
        let names = store.list().unwrap();
        assert!(names.contains(&"history.md".to_string()));
    }

    #[test]
    fn list_skips_subdirectories() {
        let (tmp, store) = test_store();

        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        store.write("top.txt", b"x").unwrap();

        let names = store.list().unwrap();
        assert_eq!(names, vec!["top.txt".to_string()]);
    }

    #[test]
    fn read_missing_is_not_found() {
        let (_tmp, store) = test_store();

        match store.read("ghost.txt") {
            Err(StoreError::NotFound(name)) => assert_eq!(name, "ghost.txt"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn delete_then_read_is_not_found() {
        let (_tmp, store) = test_store();

        store.write("gone.txt", b"bye").unwrap();
        store.delete("gone.txt").unwrap();
        assert!(matches!(
            store.read("gone.txt"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_tmp, store) = test_store();

        assert!(matches!(
            store.delete("ghost.txt"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn traversal_names_cannot_exist() {
        let (_tmp, store) = test_store();

        for name in ["../escape.txt", "a/b.txt", "..", "nested\\x.txt", ""] {
            assert!(
                matches!(store.read(name), Err(StoreError::NotFound(_))),
                "{name:?} should be unrepresentable"
            );
            assert!(matches!(
                store.write(name, b"x"),
                Err(StoreError::NotFound(_))
            ));
        }
    }

    #[test]
    fn duplicate_copies_content() {
        let (_tmp, store) = test_store();

        store.write("original.txt", b"same bytes").unwrap();
        store.duplicate("original.txt", "copy_of_original.txt").unwrap();

        assert_eq!(store.read("copy_of_original.txt").unwrap(), b"same bytes");
        assert_eq!(store.read("original.txt").unwrap(), b"same bytes");
    }

    #[test]
    fn duplicate_missing_source_is_not_found() {
        let (_tmp, store) = test_store();

        assert!(matches!(
            store.duplicate("ghost.txt", "copy.txt"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn write_overwrites_last_writer_wins() {
        let (_tmp, store) = test_store();

        store.write("doc.txt", b"first").unwrap();
        store.write("doc.txt", b"second").unwrap();
        assert_eq!(store.read("doc.txt").unwrap(), b"second");
    }
}
