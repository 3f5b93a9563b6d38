use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::DocumentStore;
use crate::core::{PrefabError, Result};
use crate::utils::fs::atomic_write;

/// Filesystem-backed document store.
///
/// Reads go through a scoped [`File`] handle that is closed before `read`
/// returns. Writes are atomic (temp file + rename).
#[derive(Debug, Clone, Default)]
pub struct FsDocumentStore {
    max_file_size: Option<u64>,
}

impl FsDocumentStore {
    /// Creates a store with no size limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_file_size: None,
        }
    }

    /// Refuses to read documents larger than `limit` bytes.
    #[must_use]
    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = Some(limit);
        self
    }

    fn read_limited(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        if let Some(limit) = self.max_file_size
            && len > limit
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file is {len} bytes, larger than the {limit} byte limit"),
            ));
        }

        let mut bytes = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tracing::debug!("Reading prefab document {}", path.display());
        self.read_limited(path).map_err(|err| PrefabError::read_failed(path, err))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tracing::debug!("Writing prefab document {} ({} bytes)", path.display(), bytes.len());
        atomic_write(path, bytes).map_err(|err| PrefabError::write_failed(path, err))
    }
}
