//! Loader configuration.
//!
//! A [`LoaderConfig`] is either built in code with [`LoaderConfig::new`] or read
//! from a caller-supplied TOML file:
//!
//! ```toml
//! project_root = "/path/to/project"
//! max_depth = 128                 # nesting guard
//! max_file_size = 16777216        # bytes; 0 disables the check
//! scan_roots = ["/path/to/project", "/path/to/gems/foo"]
//! ```
//!
//! Relative paths in the file are resolved against the directory containing
//! the file. The library never looks for a configuration file on its own.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::fs::{normalize_path, safe_write};

/// Default nesting guard for recursive loads.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum document size: 16 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

const fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn is_default_max_depth(depth: &usize) -> bool {
    *depth == DEFAULT_MAX_DEPTH
}

fn is_default_max_file_size(size: &u64) -> bool {
    *size == DEFAULT_MAX_FILE_SIZE
}

/// Settings for a [`PrefabLoader`](crate::loader::PrefabLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Root that relative document paths fall back to.
    pub project_root: PathBuf,

    /// Maximum nesting depth of a single load.
    #[serde(default = "default_max_depth", skip_serializing_if = "is_default_max_depth")]
    pub max_depth: usize,

    /// Largest document the file store will read, in bytes. `0` disables the
    /// check.
    #[serde(default = "default_max_file_size", skip_serializing_if = "is_default_max_file_size")]
    pub max_file_size: u64,

    /// Asset scan roots, highest priority first. Empty means no asset index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scan_roots: Vec<PathBuf>,
}

impl LoaderConfig {
    /// Default configuration for `project_root`.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            scan_roots: Vec::new(),
        }
    }

    /// Sets the nesting guard.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum document size (`0` disables the check).
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Sets the asset scan roots.
    #[must_use]
    pub fn with_scan_roots(mut self, scan_roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.scan_roots = scan_roots.into_iter().map(Into::into).collect();
        self
    }

    /// The size limit to enforce, if any.
    #[must_use]
    pub const fn file_size_limit(&self) -> Option<u64> {
        if self.max_file_size == 0 {
            None
        } else {
            Some(self.max_file_size)
        }
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this structure.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read loader config from {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse loader config from {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.project_root = resolve_against(base, &config.project_root);
        config.scan_roots = config.scan_roots.iter().map(|root| resolve_against(base, root)).collect();

        tracing::debug!("Loaded loader config from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as TOML, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize loader config")?;
        safe_write(path, &content)
            .with_context(|| format!("Failed to write loader config to {}", path.display()))
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
