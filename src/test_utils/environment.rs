//! Temporary prefab projects for tests.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::LoaderConfig;
use crate::loader::PrefabLoader;

/// A project root in a temporary directory.
pub struct TestProject {
    pub temp_dir: TempDir,
    pub project_dir: PathBuf,
}

impl TestProject {
    /// Create an empty project
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);

        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(&project_dir)?;

        Ok(Self {
            temp_dir,
            project_dir,
        })
    }

    /// Absolute path of a project-relative document
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.project_dir.join(relative)
    }

    /// Write raw document text
    pub fn write_raw(&self, relative: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a document DOM as pretty JSON
    pub fn write_prefab(&self, relative: impl AsRef<Path>, dom: &Value) -> Result<PathBuf> {
        self.write_raw(relative, &serde_json::to_string_pretty(dom)?)
    }

    /// Read raw document text
    pub fn read_raw(&self, relative: impl AsRef<Path>) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Read and parse a document
    pub fn read_prefab(&self, relative: impl AsRef<Path>) -> Result<Value> {
        let content = self.read_raw(relative)?;
        serde_json::from_str(&content).context("Failed to parse prefab document")
    }

    /// Whether a project-relative file exists
    pub fn file_exists(&self, relative: impl AsRef<Path>) -> bool {
        self.path(relative).exists()
    }

    /// Default configuration rooted at the project directory
    pub fn config(&self) -> LoaderConfig {
        LoaderConfig::new(&self.project_dir)
    }

    /// Filesystem-backed loader rooted at the project directory
    pub fn loader(&self) -> PrefabLoader {
        PrefabLoader::from_config(self.config())
    }
}
