//! Asset index abstraction used by the path normalizer.
//!
//! The asset index knows every scan root of the project (the project folder
//! itself, engine folders, gem folders) and can map between absolute source paths
//! and root-relative paths. It is an external service that may not be ready yet,
//! in which case the normalizer falls back to plain project-root arithmetic.

use std::path::{Path, PathBuf};

use crate::utils::fs::{is_absolute_like, normalize_path, to_slash};

/// Location of a source file as reported by the asset index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Scan root the file was found under
    pub root_folder: PathBuf,
    /// Path relative to `root_folder`, with `/` separators
    pub relative_path: String,
}

impl SourceInfo {
    /// Absolute path of the source file.
    #[must_use]
    pub fn full_path(&self) -> PathBuf {
        self.root_folder.join(&self.relative_path)
    }
}

/// Queries the normalizer makes against the asset index.
///
/// Every query may return `None`; callers treat that as a soft failure.
pub trait AssetIndex {
    /// Whether the service has finished its initial scan and answers reliably.
    fn is_ready(&self) -> bool;

    /// Looks up an existing source file by (relative or absolute) path.
    fn source_info(&self, input_path: &str) -> Option<SourceInfo>;

    /// Makes `input_path` relative to the highest-priority scan root that
    /// contains it.
    fn relative_path(&self, input_path: &str) -> Option<SourceInfo>;
}

/// An asset index that is never ready. Every lookup falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssetIndex;

impl AssetIndex for NoAssetIndex {
    fn is_ready(&self) -> bool {
        false
    }

    fn source_info(&self, _input_path: &str) -> Option<SourceInfo> {
        None
    }

    fn relative_path(&self, _input_path: &str) -> Option<SourceInfo> {
        None
    }
}

/// Asset index backed by an ordered list of scan roots.
///
/// Roots are consulted in order; the first one wins. Absolute inputs are matched
/// lexically against the roots. Relative inputs are matched against files that
/// exist on disk under a root.
#[derive(Debug, Clone, Default)]
pub struct ScanRootIndex {
    roots: Vec<PathBuf>,
}

impl ScanRootIndex {
    /// Creates an index over `roots`, highest priority first.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(|root| normalize_path(&root.into())).collect(),
        }
    }

    /// The scan roots, highest priority first.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn containing_root(&self, absolute: &Path) -> Option<SourceInfo> {
        let absolute = normalize_path(absolute);
        self.roots.iter().find_map(|root| {
            let relative = absolute.strip_prefix(root).ok()?;
            if relative.as_os_str().is_empty() {
                return None;
            }
            Some(SourceInfo {
                root_folder: root.clone(),
                relative_path: to_slash(relative),
            })
        })
    }

    fn existing_under_root(&self, relative: &str) -> Option<SourceInfo> {
        let relative = normalize_path(Path::new(relative));
        self.roots.iter().find_map(|root| {
            root.join(&relative).is_file().then(|| SourceInfo {
                root_folder: root.clone(),
                relative_path: to_slash(&relative),
            })
        })
    }
}

impl AssetIndex for ScanRootIndex {
    fn is_ready(&self) -> bool {
        !self.roots.is_empty()
    }

    fn source_info(&self, input_path: &str) -> Option<SourceInfo> {
        let input = input_path.replace('\\', "/");
        if is_absolute_like(&input) {
            self.containing_root(Path::new(&input)).filter(|info| info.full_path().is_file())
        } else {
            self.existing_under_root(&input)
        }
    }

    fn relative_path(&self, input_path: &str) -> Option<SourceInfo> {
        let input = input_path.replace('\\', "/");
        if is_absolute_like(&input) {
            self.containing_root(Path::new(&input))
        } else {
            self.existing_under_root(&input)
        }
    }
}
