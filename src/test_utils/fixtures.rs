//! Canned prefab document graphs.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

use crate::document::MemoryDocumentStore;

/// A named set of documents keyed by project-relative path.
#[derive(Clone, Debug)]
pub struct PrefabFixture {
    pub name: String,
    pub documents: Vec<(String, Value)>,
}

impl PrefabFixture {
    /// Empty fixture
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Vec::new(),
        }
    }

    /// Builder-style document addition
    #[must_use]
    pub fn with_document(mut self, path: impl Into<String>, dom: Value) -> Self {
        self.documents.push((path.into(), dom));
        self
    }

    /// `parent.prefab` nesting `child.prefab` as `child_0`
    pub fn nested() -> Self {
        Self::new("nested")
            .with_document(
                "parent.prefab",
                json!({"instances": {"child_0": {"source": "child.prefab"}}}),
            )
            .with_document("child.prefab", json!({"entities": {"E1": {"name": "Lamp"}}}))
    }

    /// `a.prefab` and `b.prefab` nesting each other
    pub fn cycle() -> Self {
        Self::new("cycle")
            .with_document("a.prefab", json!({"instances": {"b": {"source": "b.prefab"}}}))
            .with_document("b.prefab", json!({"instances": {"a": {"source": "a.prefab"}}}))
    }

    /// `top` nests `left` and `right`, both nest `leaf`
    pub fn diamond() -> Self {
        Self::new("diamond")
            .with_document(
                "top.prefab",
                json!({"instances": {
                    "left": {"source": "left.prefab"},
                    "right": {"source": "right.prefab"}
                }}),
            )
            .with_document("left.prefab", json!({"instances": {"leaf": {"source": "leaf.prefab"}}}))
            .with_document("right.prefab", json!({"instances": {"leaf": {"source": "leaf.prefab"}}}))
            .with_document("leaf.prefab", json!({"entities": {"E1": {"name": "Leaf"}}}))
    }

    /// `parent.prefab` nesting `broken.prefab`, which the fixture does not provide
    pub fn broken_child() -> Self {
        Self::new("broken_child").with_document(
            "parent.prefab",
            json!({"instances": {"child_0": {"source": "broken.prefab"}}}),
        )
    }

    /// Write every document under `root`
    pub fn write_to(&self, root: &Path) -> Result<()> {
        for (relative, dom) in &self.documents {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_json::to_string_pretty(dom)?)
                .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        }
        Ok(())
    }

    /// In-memory store holding every document under `root`
    pub fn memory_store(&self, root: &Path) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (relative, dom) in &self.documents {
            store.insert(root.join(relative), dom.to_string());
        }
        store
    }
}
