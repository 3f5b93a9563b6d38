//! Writing templates back to disk.
//!
//! A template is saved in thin form: defaults are stripped, every nested
//! instance the template links to is collapsed to its link reference
//! (`{"source": ..., "patches": [...]}`), and the root `source` member the
//! loader injected is removed. Nested templates are never saved as a side
//! effect.

use std::path::Path;

use serde_json::Value;

use super::PrefabLoader;
use crate::core::{PrefabError, Result};
use crate::document::{self, DocumentStore};
use crate::normalize::deflate;
use crate::normalize::model::SOURCE_MEMBER;
use crate::registry::{TemplateId, TemplateRegistry};

impl<S: DocumentStore> PrefabLoader<S> {
    /// Saves a template to the location its path resolves to and clears its
    /// dirty flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing or invalid, cannot be
    /// collapsed, or cannot be written.
    pub fn save(&self, registry: &mut TemplateRegistry, id: TemplateId) -> Result<()> {
        let (file_path, bytes) = self.collapse(registry, id)?;
        let location = self.normalizer.to_absolute(Path::new(&file_path));
        self.write_and_clean(registry, id, &location, &bytes)
    }

    /// Saves a template to an explicit absolute location.
    ///
    /// The location must resolve to the template's own path.
    ///
    /// # Errors
    ///
    /// Returns [`PrefabError::PathMismatch`] when it does not, and otherwise
    /// fails like [`save`](Self::save).
    pub fn save_to(&self, registry: &mut TemplateRegistry, id: TemplateId, location: &Path) -> Result<()> {
        let (file_path, bytes) = self.collapse(registry, id)?;
        let actual = self.normalizer.to_relative(location);
        if actual != file_path {
            return Err(PrefabError::PathMismatch {
                expected: file_path,
                actual,
                location: location.to_path_buf(),
            });
        }
        self.write_and_clean(registry, id, location, &bytes)
    }

    /// Renders a template exactly as [`save`](Self::save) would write it.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing or invalid or cannot be
    /// collapsed.
    pub fn save_to_string(&self, registry: &TemplateRegistry, id: TemplateId) -> Result<String> {
        let (file_path, bytes) = self.collapse(registry, id)?;
        String::from_utf8(bytes).map_err(|err| PrefabError::Normalization {
            path: file_path,
            reason: err.to_string(),
        })
    }

    /// Saves every dirty template, each after the templates it embeds.
    ///
    /// Returns the ids that were written, in write order. Stops at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns the first save failure.
    pub fn save_all_dirty(&self, registry: &mut TemplateRegistry) -> Result<Vec<TemplateId>> {
        let order = registry.dependency_order().map_err(|err| PrefabError::DuplicateOrRegistry {
            path: String::new(),
            reason: err.to_string(),
        })?;

        let mut saved = Vec::new();
        for id in order {
            if registry.find(id).is_some_and(|template| template.is_dirty()) {
                self.save(registry, id)?;
                saved.push(id);
            }
        }
        tracing::debug!("Saved {} dirty templates", saved.len());
        Ok(saved)
    }

    fn write_and_clean(
        &self,
        registry: &mut TemplateRegistry,
        id: TemplateId,
        location: &Path,
        bytes: &[u8],
    ) -> Result<()> {
        self.store.write(location, bytes)?;
        registry.set_dirty(id, false).map_err(|_| PrefabError::TemplateNotFound {
            template_id: id,
        })?;
        tracing::debug!("Saved template {} to {}", id, location.display());
        Ok(())
    }

    /// Builds the on-disk bytes of a template.
    fn collapse(&self, registry: &TemplateRegistry, id: TemplateId) -> Result<(String, Vec<u8>)> {
        let template = registry.find(id).ok_or(PrefabError::TemplateNotFound {
            template_id: id,
        })?;
        let file_path = template.file_path().to_string();
        if !template.is_valid() {
            return Err(PrefabError::InvalidTemplate {
                template_id: id,
                path: file_path,
            });
        }

        let mut out = template.dom().clone();
        deflate(&mut out).map_err(|err| PrefabError::Normalization {
            path: file_path.clone(),
            reason: err.to_string(),
        })?;

        for link_id in template.sorted_link_ids() {
            let link_error = |reason: String| PrefabError::LinkIntegrity {
                path: file_path.clone(),
                link_id,
                reason,
            };
            let link = registry.find_link(link_id).ok_or_else(|| link_error("link is not registered".into()))?;
            if !link.is_valid() {
                return Err(link_error("link is not valid".into()));
            }
            let slot = out.pointer_mut(link.instance_path()).ok_or_else(|| {
                link_error(format!("no nested instance at '{}'", link.instance_path()))
            })?;
            *slot = link.link_dom().clone();
        }

        if let Some(members) = out.as_object_mut() {
            members.shift_remove(SOURCE_MEMBER);
        }

        let bytes = document::serialize(&out).map_err(|err| PrefabError::Normalization {
            path: file_path.clone(),
            reason: err.to_string(),
        })?;
        Ok((file_path, bytes))
    }
}

/// Returns `dom` without its root `source` member.
///
/// Handy for comparing an in-memory DOM against a reloaded one.
#[must_use]
pub fn without_source(dom: &Value) -> Value {
    let mut dom = dom.clone();
    if let Some(members) = dom.as_object_mut() {
        members.shift_remove(SOURCE_MEMBER);
    }
    dom
}
