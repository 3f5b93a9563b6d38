use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use super::DocumentStore;
use crate::core::{PrefabError, Result};
use crate::utils::fs::normalize_path;

/// In-memory document store.
///
/// Keeps documents in a map keyed by normalized path and counts reads per path,
/// which makes it easy to observe how often the loader touches each document.
/// Interior mutability keeps the [`DocumentStore`] methods on `&self`; the store
/// is meant for single-threaded use like the loader itself.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RefCell<HashMap<PathBuf, Vec<u8>>>,
    reads: RefCell<HashMap<PathBuf, usize>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a document.
    pub fn insert(&self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) {
        self.documents.borrow_mut().insert(normalize_path(path.as_ref()), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_document(self, path: impl AsRef<Path>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Returns a copy of the document at `path`, if present.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.documents.borrow().get(&normalize_path(path.as_ref())).cloned()
    }

    /// Returns the document at `path` as text, if present and valid UTF-8.
    #[must_use]
    pub fn get_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.get(path).and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Whether a document exists at `path`.
    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.documents.borrow().contains_key(&normalize_path(path.as_ref()))
    }

    /// Number of successful and failed reads of `path` so far.
    #[must_use]
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads.borrow().get(&normalize_path(path.as_ref())).copied().unwrap_or(0)
    }

    /// Total number of reads across all paths.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        self.reads.borrow().values().sum()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let key = normalize_path(path);
        *self.reads.borrow_mut().entry(key.clone()).or_insert(0) += 1;

        self.documents.borrow().get(&key).cloned().ok_or_else(|| {
            PrefabError::read_failed(
                path,
                io::Error::new(io::ErrorKind::NotFound, "document not found in memory store"),
            )
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.documents.borrow_mut().insert(normalize_path(path), bytes.to_vec());
        Ok(())
    }
}
