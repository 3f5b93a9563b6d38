//! Prefab Loader - nested scene-template loading and saving
//!
//! A prefab is a JSON document describing a reusable group of scene entities.
//! Prefabs nest other prefabs by relative path, optionally overriding parts of
//! them with RFC 6902 patches. This crate loads a prefab and everything it
//! transitively nests into an in-memory [`TemplateRegistry`](registry::TemplateRegistry),
//! and writes templates back in their canonical on-disk form.
//!
//! # Architecture Overview
//!
//! - Documents live on disk in *thin* form: default values stripped, nested
//!   instances written as `{"source": ..., "patches": [...]}` references.
//! - In memory every template is in *fat* form: defaults materialized, a root
//!   `source` member naming its path, and every nested instance expanded into a
//!   patched copy of the nested template.
//! - The registry owns templates and the links between them, and keeps the link
//!   graph acyclic.
//!
//! # Core Modules
//!
//! - [`loader`] - Recursive load with cycle detection, and the saver
//! - [`registry`] - Templates, links, observers, invariant checking
//! - [`normalize`] - Fat/thin normalization over a typed document model
//! - [`patch`] - RFC 6902 patch application for instance overrides
//! - [`paths`] - Canonical relative paths and the asset index
//! - [`document`] - Byte-level document stores, parsing and serialization
//!
//! ## Supporting Modules
//! - [`config`] - Loader configuration (TOML)
//! - [`core`] - Error types
//! - [`utils`] - Atomic writes, lexical path helpers, path validation
//!
//! # Document Format
//!
//! ```json
//! {
//!     "entities": {
//!         "Entity_1": {"name": "Lamp", "transform": {"translation": [0.0, 2.0, 0.0]}}
//!     },
//!     "instances": {
//!         "door": {
//!             "source": "props/door.prefab",
//!             "patches": [{"op": "replace", "path": "/entities/Entity_1/active", "value": false}]
//!         }
//!     }
//! }
//! ```
//!
//! # Quick Start
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
//! let town = loader.load_from_path(&mut registry, "levels/town.prefab")?;
//! registry.set_dirty(town, true).ok();
//! loader.save_all_dirty(&mut registry)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

pub mod config;
pub mod core;
pub mod document;
pub mod loader;
pub mod normalize;
pub mod patch;
pub mod paths;
pub mod registry;
pub mod utils;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
