//! Atomic file write operations using temp-and-rename strategy.
//!
//! Prefab documents are rewritten in place on every save, so a crash mid-write
//! must never leave a truncated document behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// This function ensures atomic writes by:
/// 1. Writing content to a temporary file in the target's directory
/// 2. Syncing the temporary file to disk
/// 3. Atomically renaming the temporary file over the target path
///
/// Readers never observe a partially written document. The temporary file is
/// removed on every failure path.
///
/// # Arguments
///
/// * `path` - The target file path
/// * `content` - The raw bytes to write
///
/// # Examples
///
/// ```rust,no_run
/// use prefab_loader::utils::fs::atomic_write;
/// use std::path::Path;
///
/// # fn example() -> std::io::Result<()> {
/// atomic_write(Path::new("levels/town.prefab"), b"{}\n")?;
/// # Ok(())
/// # }
/// ```
///
/// # Guarantees
///
/// - **Atomicity**: File contents are never in a partial state
/// - **Durability**: Content is synced to disk before rename
/// - **Safety**: Parent directories are created automatically
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|err| err.error)?;

    tracing::trace!("Atomically wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Safely writes a string to a file using atomic operations.
///
/// Convenience wrapper around [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> io::Result<()> {
    atomic_write(path, content.as_bytes())
}
