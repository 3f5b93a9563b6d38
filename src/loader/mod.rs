//! Recursive prefab loading.
//!
//! [`PrefabLoader`] turns a document path (or bytes plus an origin path) into a
//! registered [`Template`](crate::registry::Template), loading every document
//! it transitively nests and linking each one into its parent.
//!
//! # Load algorithm
//!
//! For one document:
//!
//! 1. Validate and canonicalize the path.
//! 2. Refuse it if it is already being loaded further up the call chain
//!    ([`PrefabError::CyclicDependency`]).
//! 3. Return the existing template when the path is already registered.
//! 4. Refuse to go deeper than [`LoaderConfig::max_depth`].
//! 5. Read, parse, stamp the root `source` member, and register.
//! 6. For each nested instance, in document order: load its `source`
//!    recursively and link it into this template.
//! 7. Inflate the DOM and record whether anything below failed.
//!
//! Failures in steps 1-5 are returned and register nothing. Failures while
//! handling a nested instance are logged, skip that instance, and flag the
//! template (and every template above it) as loaded with errors; the load
//! itself still succeeds.
//!
//! # Saving
//!
//! The mirror operations live in [`saver`]: a template is deflated, each
//! expanded nested instance is collapsed back to its link reference, the
//! injected `source` member is removed, and the bytes are written.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefab_loader::config::LoaderConfig;
//! use prefab_loader::loader::PrefabLoader;
//! use prefab_loader::registry::TemplateRegistry;
//!
//! # fn example() -> prefab_loader::core::Result<()> {
//! let loader = PrefabLoader::from_config(LoaderConfig::new("/project"));
//! let mut registry = TemplateRegistry::new();
//!
//! let id = loader.load_from_path(&mut registry, "levels/town.prefab")?;
//! if registry.find(id).is_some_and(|template| template.is_loaded_with_errors()) {
//!     eprintln!("town loaded with errors");
//! }
//! # Ok(())
//! # }
//! ```

pub mod saver;
mod visiting;

use std::path::Path;

use serde_json::Value;

use crate::config::LoaderConfig;
use crate::core::{PrefabError, Result};
use crate::document::{self, DocumentStore, FsDocumentStore};
use crate::normalize::inflate;
use crate::normalize::model::{INSTANCES_MEMBER, SOURCE_MEMBER};
use crate::patch::pointer_from_tokens;
use crate::paths::{AssetIndex, NoAssetIndex, PathNormalizer, ScanRootIndex};
use crate::registry::{TemplateId, TemplateRegistry};
use crate::utils::is_valid_prefab_path;
use visiting::VisitingSet;

/// JSON pointer of the nested instance `name` in a template DOM.
///
/// ```rust,no_run
/// use prefab_loader::loader::instance_pointer_for;
///
/// assert_eq!(instance_pointer_for("child_0"), "/instances/child_0");
/// assert_eq!(instance_pointer_for("a/b"), "/instances/a~1b");
/// ```
#[must_use]
pub fn instance_pointer_for(name: &str) -> String {
    pointer_from_tokens([INSTANCES_MEMBER, name])
}

/// Loads and saves prefab documents against a [`TemplateRegistry`].
///
/// The loader holds no registry state of its own; the registry is passed to
/// every call.
#[derive(Debug)]
pub struct PrefabLoader<S: DocumentStore = FsDocumentStore> {
    normalizer: PathNormalizer,
    store: S,
    config: LoaderConfig,
}

impl PrefabLoader<FsDocumentStore> {
    /// Builds a filesystem-backed loader from a configuration.
    ///
    /// The asset index is a [`ScanRootIndex`] over the configured scan roots,
    /// or [`NoAssetIndex`] when there are none.
    #[must_use]
    pub fn from_config(config: LoaderConfig) -> Self {
        let asset_index: Box<dyn AssetIndex> = if config.scan_roots.is_empty() {
            Box::new(NoAssetIndex)
        } else {
            Box::new(ScanRootIndex::new(config.scan_roots.iter().cloned()))
        };
        let normalizer = PathNormalizer::new(config.project_root.clone(), asset_index);

        let mut store = FsDocumentStore::new();
        if let Some(limit) = config.file_size_limit() {
            store = store.with_max_file_size(limit);
        }

        Self::new(normalizer, store, config)
    }
}

/// Where the bytes of the document being loaded come from.
#[derive(Clone, Copy)]
enum Source<'a> {
    Store,
    Bytes(&'a [u8]),
}

/// A nested instance as found in a freshly registered DOM.
struct NestedInstance {
    name: String,
    source: Option<String>,
}

impl<S: DocumentStore> PrefabLoader<S> {
    /// Creates a loader from its parts.
    pub const fn new(normalizer: PathNormalizer, store: S, config: LoaderConfig) -> Self {
        Self {
            normalizer,
            store,
            config,
        }
    }

    /// The document store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The path normalizer.
    pub const fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// The configuration the loader was built with.
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads the document at `path` and everything it nests.
    ///
    /// Returns the id of the existing template when the path is already
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns an error when the document itself cannot be validated, read,
    /// parsed, or registered, or when it closes a cycle or exceeds the depth
    /// limit. Failures of nested documents do not fail the load; they flag the
    /// template as loaded with errors.
    pub fn load_from_path(
        &self,
        registry: &mut TemplateRegistry,
        path: impl AsRef<Path>,
    ) -> Result<TemplateId> {
        let mut visiting = VisitingSet::new();
        let result = self.load_recursive(registry, Source::Store, path.as_ref(), &mut visiting);
        debug_assert!(visiting.is_empty());
        result
    }

    /// Loads a document from `bytes`, registering it under `origin_path`.
    ///
    /// Nested documents are read from the store.
    ///
    /// # Errors
    ///
    /// See [`load_from_path`](Self::load_from_path).
    pub fn load_from_bytes(
        &self,
        registry: &mut TemplateRegistry,
        bytes: &[u8],
        origin_path: impl AsRef<Path>,
    ) -> Result<TemplateId> {
        let mut visiting = VisitingSet::new();
        let result =
            self.load_recursive(registry, Source::Bytes(bytes), origin_path.as_ref(), &mut visiting);
        debug_assert!(visiting.is_empty());
        result
    }

    fn load_recursive(
        &self,
        registry: &mut TemplateRegistry,
        source: Source<'_>,
        origin_path: &Path,
        visiting: &mut VisitingSet,
    ) -> Result<TemplateId> {
        if !self.normalizer.is_valid(origin_path) {
            return Err(PrefabError::invalid_path(origin_path.to_string_lossy()));
        }
        let relative_path = self.normalizer.to_relative(origin_path);

        if visiting.contains(&relative_path) {
            return Err(PrefabError::CyclicDependency {
                chain: visiting.chain_to(&relative_path),
                path: relative_path,
            });
        }

        if let Some(existing) = registry.find_by_path(&relative_path) {
            return Ok(existing);
        }

        if visiting.len() >= self.config.max_depth {
            return Err(PrefabError::DepthExceeded {
                path: relative_path,
                max_depth: self.config.max_depth,
            });
        }

        let owned;
        let bytes = match source {
            Source::Bytes(bytes) => bytes,
            Source::Store => {
                owned = self.store.read(&self.normalizer.to_absolute(Path::new(&relative_path)))?;
                owned.as_slice()
            }
        };

        let mut dom = document::parse(bytes, &relative_path)?;
        if let Some(members) = dom.as_object_mut() {
            members.insert(SOURCE_MEMBER.to_string(), Value::String(relative_path.clone()));
        }

        let id = registry.add_template(&relative_path, dom).map_err(|err| {
            PrefabError::DuplicateOrRegistry {
                path: relative_path.clone(),
                reason: err.to_string(),
            }
        })?;

        visiting.push(&relative_path);
        let loaded_with_errors = self.build_nested(registry, id, &relative_path, visiting);
        visiting.remove(&relative_path);

        if let Err(err) = registry.set_loaded_with_errors(id, loaded_with_errors) {
            tracing::error!("Failed to finalize template '{}': {}", relative_path, err);
        }

        if loaded_with_errors {
            tracing::debug!("Loaded prefab '{}' as template {} with errors", relative_path, id);
        } else {
            tracing::debug!("Loaded prefab '{}' as template {}", relative_path, id);
        }
        Ok(id)
    }

    /// Loads and links every nested instance of `id`, then inflates its DOM.
    ///
    /// Returns whether anything failed along the way.
    fn build_nested(
        &self,
        registry: &mut TemplateRegistry,
        id: TemplateId,
        relative_path: &str,
        visiting: &mut VisitingSet,
    ) -> bool {
        let mut loaded_with_errors = false;

        for instance in nested_instances(registry, id) {
            if !is_valid_prefab_path(&instance.name) {
                tracing::error!(
                    "Nested instance '{}' in '{}' has an invalid name. Skipping it.",
                    instance.name,
                    relative_path
                );
                loaded_with_errors = true;
                continue;
            }

            let Some(child_path) = instance.source.filter(|source| !source.is_empty()) else {
                tracing::error!(
                    "Nested instance '{}' in '{}' has no source path. Skipping it.",
                    instance.name,
                    relative_path
                );
                loaded_with_errors = true;
                continue;
            };

            let child_id =
                match self.load_recursive(registry, Source::Store, Path::new(&child_path), visiting) {
                    Ok(child_id) => child_id,
                    Err(err) => {
                        tracing::error!(
                            "Failed to load nested instance '{}' from '{}' in '{}': {}",
                            instance.name,
                            child_path,
                            relative_path,
                            err
                        );
                        loaded_with_errors = true;
                        continue;
                    }
                };

            if let Err(err) =
                registry.add_link(child_id, id, &instance_pointer_for(&instance.name), None)
            {
                tracing::error!(
                    "Failed to link nested instance '{}' from '{}' into '{}': {}",
                    instance.name,
                    child_path,
                    relative_path,
                    err
                );
                loaded_with_errors = true;
            }

            if registry.find(child_id).is_some_and(|child| child.is_loaded_with_errors()) {
                tracing::error!(
                    "Nested instance '{}' in '{}' references '{}', which was loaded with errors",
                    instance.name,
                    relative_path,
                    child_path
                );
                loaded_with_errors = true;
            }
        }

        if let Some(dom) = registry.template_dom_mut(id)
            && let Err(err) = inflate(dom)
        {
            tracing::error!("Failed to sanitize prefab '{}': {}", relative_path, err);
            loaded_with_errors = true;
        }

        loaded_with_errors
    }
}

/// Nested instances of a registered template, in document order.
fn nested_instances(registry: &TemplateRegistry, id: TemplateId) -> Vec<NestedInstance> {
    let Some(instances) = registry.find(id).and_then(|template| template.instances()) else {
        return Vec::new();
    };
    instances
        .iter()
        .map(|(name, instance)| NestedInstance {
            name: name.clone(),
            source: instance.get(SOURCE_MEMBER).and_then(Value::as_str).map(str::to_string),
        })
        .collect()
}
