//! Canonical relative paths for prefab documents.
//!
//! Templates are keyed by their path relative to a scan root, with `/`
//! separators. [`PathNormalizer`] converts any caller-supplied path (absolute,
//! relative, either separator) to that key and back to an absolute location on
//! disk. It consults the [`AssetIndex`] first and falls back to lexical
//! arithmetic against the project root when the index cannot answer.
//!
//! The normalizer is pure given its inputs and configuration; it never touches
//! the template registry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefab_loader::paths::PathNormalizer;
//! use std::path::Path;
//!
//! let normalizer = PathNormalizer::without_index("/project");
//! assert_eq!(normalizer.to_relative(Path::new("/project/levels/town.prefab")), "levels/town.prefab");
//! assert_eq!(normalizer.to_absolute(Path::new("levels/town.prefab")), Path::new("/project/levels/town.prefab"));
//! ```

pub mod asset_index;

use std::path::{Path, PathBuf};

pub use asset_index::{AssetIndex, NoAssetIndex, ScanRootIndex, SourceInfo};

use crate::utils::fs::{is_absolute_like, lexically_relative, normalize_path, to_slash};
use crate::utils::path_validation::is_valid_prefab_path;

/// Converts between caller paths and canonical registry keys.
pub struct PathNormalizer {
    project_root: PathBuf,
    asset_index: Box<dyn AssetIndex>,
}

impl std::fmt::Debug for PathNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathNormalizer")
            .field("project_root", &self.project_root)
            .field("asset_index_ready", &self.asset_index.is_ready())
            .finish()
    }
}

impl PathNormalizer {
    /// Creates a normalizer for `project_root` backed by `asset_index`.
    pub fn new(project_root: impl Into<PathBuf>, asset_index: Box<dyn AssetIndex>) -> Self {
        Self {
            project_root: normalize_path(&project_root.into()),
            asset_index,
        }
    }

    /// Creates a normalizer that always uses the project-root fallback.
    pub fn without_index(project_root: impl Into<PathBuf>) -> Self {
        Self::new(project_root, Box::new(NoAssetIndex))
    }

    /// The project root used by the fallback logic.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Checks whether `path` is acceptable as a prefab path.
    ///
    /// See [`is_valid_prefab_path`] for the rules.
    #[must_use]
    pub fn is_valid(&self, path: &Path) -> bool {
        is_valid_prefab_path(&path.to_string_lossy())
    }

    /// Converts `path` to its canonical relative form.
    ///
    /// The asset index is asked first. When it cannot answer, absolute paths are
    /// made lexically relative to the project root and relative paths are kept,
    /// with separators converted to `/` and `.` components removed.
    #[must_use]
    pub fn to_relative(&self, path: &Path) -> String {
        let input = to_slash(path);

        if let Some(info) = self.asset_index.relative_path(&input)
            && !info.relative_path.is_empty()
        {
            return info.relative_path;
        }

        if self.asset_index.is_ready() {
            tracing::error!(
                "Relative source path for '{}' could not be determined. Using project path as relative root.",
                input
            );
        }

        if is_absolute_like(&input) {
            match lexically_relative(Path::new(&input), &self.project_root) {
                Some(relative) => to_slash(&relative),
                None => to_slash(&normalize_path(Path::new(&input))),
            }
        } else {
            to_slash(&normalize_path(Path::new(&input)))
        }
    }

    /// Converts `path` to an absolute location on disk.
    ///
    /// Absolute input is returned unchanged. Relative input is resolved through
    /// the asset index, falling back to `project_root / path`.
    #[must_use]
    pub fn to_absolute(&self, path: &Path) -> PathBuf {
        let input = to_slash(path);
        if is_absolute_like(&input) {
            return path.to_path_buf();
        }

        if let Some(info) = self.asset_index.source_info(&input) {
            return info.full_path();
        }

        if self.asset_index.is_ready() {
            tracing::error!(
                "Full source path for '{}' could not be determined. Using fallback logic.",
                input
            );
        }

        self.project_root.join(normalize_path(Path::new(&input)))
    }
}
