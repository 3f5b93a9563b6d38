//! In-memory template registry.
//!
//! The registry owns every loaded [`Template`] and every [`Link`] between
//! templates, and is the single authority over their ids. A link records that
//! a *target* template embeds a *source* template as a nested instance; when a
//! link is added the nested instance inside the target DOM is expanded into a
//! full copy of the source DOM with the link's override patches applied.
//!
//! # Invariants
//!
//! After every public operation:
//!
//! - the path index and the template table are in bijection
//! - every link's source and target resolve to registered templates
//! - templates plus links (as source → target edges) form a DAG
//! - every registered path is a valid relative prefab path
//!
//! [`TemplateRegistry::check_invariants`] verifies all of the above.
//!
//! # Observers
//!
//! Types implementing [`RegistryObserver`] can be registered with
//! [`TemplateRegistry::add_observer`]; they are notified synchronously after
//! each mutation.

mod graph;
pub mod link;
pub mod observer;
pub mod template;

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::kind_name;
use crate::normalize::model::{LINK_ID_MEMBER, PATCHES_MEMBER, SOURCE_MEMBER};
use crate::patch::{PatchError, apply_patches, parse_pointer};
use crate::utils::is_valid_prefab_path;
use graph::TemplateGraph;

pub use link::{Link, LinkId};
pub use observer::{EventRecorder, RegistryEvent, RegistryObserver};
pub use template::{Template, TemplateId};

/// Errors raised by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A template with this path is already registered.
    #[error("template path '{path}' is already registered (template {existing})")]
    DuplicatePath {
        /// Offending path
        path: String,
        /// Template already holding the path
        existing: TemplateId,
    },

    /// The path is not a valid relative prefab path.
    #[error("invalid template path '{path}'")]
    InvalidPath {
        /// Offending path
        path: String,
    },

    /// Template DOMs must be JSON objects.
    #[error("template '{path}' must have an object DOM, found {found}")]
    InvalidDom {
        /// Template path
        path: String,
        /// Kind of value that was supplied
        found: &'static str,
    },

    /// No template with this id.
    #[error("template {0} is not registered")]
    TemplateNotFound(TemplateId),

    /// A template cannot embed itself.
    #[error("template {0} cannot be linked into itself")]
    SelfLink(TemplateId),

    /// The link would close a cycle in the template graph.
    #[error("linking template {source_id} into template {target_id} would create a cycle")]
    WouldCreateCycle {
        /// Embedded template
        source_id: TemplateId,
        /// Embedding template
        target_id: TemplateId,
    },

    /// The instance pointer does not resolve in the target DOM.
    #[error("no instance at '{instance_path}' in template {target_id}")]
    InstanceNotFound {
        /// Embedding template
        target_id: TemplateId,
        /// JSON pointer of the instance
        instance_path: String,
    },

    /// The instance exists but cannot be linked.
    #[error("invalid instance at '{instance_path}' in template {target_id}: {reason}")]
    InvalidInstance {
        /// Embedding template
        target_id: TemplateId,
        /// JSON pointer of the instance
        instance_path: String,
        /// What was wrong
        reason: String,
    },

    /// The link's override patches could not be applied to the source DOM.
    #[error("failed to apply patches of instance '{instance_path}' in template {target_id}")]
    Patch {
        /// Embedding template
        target_id: TemplateId,
        /// JSON pointer of the instance
        instance_path: String,
        /// Underlying patch failure
        #[source]
        source: PatchError,
    },

    /// The template graph is not acyclic.
    #[error("template graph contains a cycle: {chain}")]
    Cycle {
        /// Template ids along the cycle, `1 → 2 → 1`
        chain: String,
    },

    /// A structural invariant does not hold.
    #[error("registry invariant violated: {0}")]
    InvariantViolated(String),
}

/// Owner of all templates and links.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateId, Template>,
    by_path: HashMap<String, TemplateId>,
    links: HashMap<LinkId, Link>,
    last_template_id: u64,
    last_link_id: u64,
    observers: Vec<Box<dyn RegistryObserver>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.templates.len())
            .field("links", &self.links.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

fn notify(observers: &mut [Box<dyn RegistryObserver>], mut f: impl FnMut(&mut dyn RegistryObserver)) {
    for observer in observers {
        f(observer.as_mut());
    }
}

fn format_chain(ids: &[TemplateId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(" → ")
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer.
    pub fn add_observer(&mut self, observer: Box<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    /// Looks up a template by canonical relative path.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<TemplateId> {
        self.by_path.get(path).copied()
    }

    /// Looks up a template by id.
    #[must_use]
    pub fn find(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(&id)
    }

    /// Looks up a link by id.
    #[must_use]
    pub fn find_link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Number of registered templates.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of registered links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// All templates, in ascending id order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        let mut templates: Vec<_> = self.templates.values().collect();
        templates.sort_unstable_by_key(|template| template.id());
        templates.into_iter()
    }

    /// Links embedding other templates into `target`, in ascending id order.
    #[must_use]
    pub fn links_to(&self, target: TemplateId) -> Vec<&Link> {
        self.sorted_links(|link| link.target_template_id == target)
    }

    /// Links embedding `source` into other templates, in ascending id order.
    #[must_use]
    pub fn links_from(&self, source: TemplateId) -> Vec<&Link> {
        self.sorted_links(|link| link.source_template_id == source)
    }

    fn sorted_links(&self, predicate: impl Fn(&Link) -> bool) -> Vec<&Link> {
        let mut links: Vec<_> = self.links.values().filter(|link| predicate(link)).collect();
        links.sort_unstable_by_key(|link| link.id);
        links
    }

    /// Registers a template under a canonical relative path.
    ///
    /// # Errors
    ///
    /// Fails when the path is invalid or already registered, or when `dom` is
    /// not a JSON object. Nothing is registered in that case.
    pub fn add_template(&mut self, path: &str, dom: Value) -> Result<TemplateId, RegistryError> {
        if !is_valid_prefab_path(path) {
            return Err(RegistryError::InvalidPath {
                path: path.to_string(),
            });
        }
        if let Some(&existing) = self.by_path.get(path) {
            return Err(RegistryError::DuplicatePath {
                path: path.to_string(),
                existing,
            });
        }
        if !dom.is_object() {
            return Err(RegistryError::InvalidDom {
                path: path.to_string(),
                found: kind_name(&dom),
            });
        }

        self.last_template_id += 1;
        let id = TemplateId::new(self.last_template_id);
        self.by_path.insert(path.to_string(), id);
        let template = self.templates.entry(id).or_insert(Template::new(id, path.to_string(), dom));
        tracing::debug!("Registered template {} as '{}'", id, path);

        notify(&mut self.observers, |observer| observer.template_added(template));
        Ok(id)
    }

    /// Links `source_id` into `target_id` at the instance `instance_path`.
    ///
    /// The link DOM is `override_dom` when given (its `source` forced to the
    /// source template's path), otherwise `source` plus the instance's own
    /// `patches`. The instance value in the target DOM is then replaced by a
    /// copy of the source DOM with the patches applied and a `link_id` member
    /// naming the new link.
    ///
    /// # Errors
    ///
    /// Fails when either template is missing, the link would be a self link or
    /// close a cycle, the instance is missing or not an object, or the patches
    /// do not apply. The registry is unchanged in that case.
    pub fn add_link(
        &mut self,
        source_id: TemplateId,
        target_id: TemplateId,
        instance_path: &str,
        override_dom: Option<Value>,
    ) -> Result<LinkId, RegistryError> {
        let source = self.templates.get(&source_id).ok_or(RegistryError::TemplateNotFound(source_id))?;
        let target = self.templates.get(&target_id).ok_or(RegistryError::TemplateNotFound(target_id))?;
        if source_id == target_id {
            return Err(RegistryError::SelfLink(source_id));
        }
        if self.graph().has_path(target_id, source_id) {
            return Err(RegistryError::WouldCreateCycle {
                source_id,
                target_id,
            });
        }

        let invalid_instance = |reason: String| RegistryError::InvalidInstance {
            target_id,
            instance_path: instance_path.to_string(),
            reason,
        };
        if !instance_path.starts_with('/') {
            return Err(invalid_instance("instance path must be a non-root JSON pointer".into()));
        }
        parse_pointer(instance_path).map_err(|err| invalid_instance(err.to_string()))?;
        let instance = target.dom.pointer(instance_path).ok_or_else(|| RegistryError::InstanceNotFound {
            target_id,
            instance_path: instance_path.to_string(),
        })?;
        let Some(instance) = instance.as_object() else {
            return Err(invalid_instance(format!("expected an object, found {}", kind_name(instance))));
        };

        let link_dom = match override_dom {
            Some(Value::Object(mut members)) => {
                members.shift_remove(SOURCE_MEMBER);
                let mut link_dom = Map::new();
                link_dom.insert(SOURCE_MEMBER.to_string(), Value::String(source.file_path.clone()));
                link_dom.extend(members);
                link_dom
            }
            Some(other) => {
                return Err(invalid_instance(format!(
                    "override DOM must be an object, found {}",
                    kind_name(&other)
                )));
            }
            None => {
                let mut link_dom = Map::new();
                link_dom.insert(SOURCE_MEMBER.to_string(), Value::String(source.file_path.clone()));
                if let Some(patches) = instance.get(PATCHES_MEMBER) {
                    link_dom.insert(PATCHES_MEMBER.to_string(), patches.clone());
                }
                link_dom
            }
        };
        let mut link_dom = Value::Object(link_dom);
        if let Some(members) = link_dom.as_object_mut()
            && members.get(PATCHES_MEMBER).is_some_and(is_empty_patch_list)
        {
            members.shift_remove(PATCHES_MEMBER);
        }

        let mut expanded = source.dom.clone();
        let patches = link_dom.get(PATCHES_MEMBER).cloned().unwrap_or(Value::Null);
        apply_patches(&mut expanded, &patches).map_err(|source| RegistryError::Patch {
            target_id,
            instance_path: instance_path.to_string(),
            source,
        })?;
        if !expanded.is_object() {
            return Err(invalid_instance("patches must leave the instance an object".into()));
        }

        self.last_link_id += 1;
        let link_id = LinkId::new(self.last_link_id);
        if let Some(members) = expanded.as_object_mut() {
            members.insert(LINK_ID_MEMBER.to_string(), Value::from(link_id.get()));
        }

        let target = self.templates.get_mut(&target_id).ok_or(RegistryError::TemplateNotFound(target_id))?;
        if let Some(slot) = target.dom_mut().pointer_mut(instance_path) {
            *slot = expanded;
        }
        target.link_ids.insert(link_id);

        let link = self.links.entry(link_id).or_insert(Link {
            id: link_id,
            source_template_id: source_id,
            target_template_id: target_id,
            instance_path: instance_path.to_string(),
            link_dom,
        });
        tracing::debug!(
            "Linked template {} into template {} at '{}' (link {})",
            source_id,
            target_id,
            instance_path,
            link_id
        );

        notify(&mut self.observers, |observer| observer.link_added(link));
        Ok(link_id)
    }

    /// Sets the loaded-with-errors flag of a template.
    ///
    /// # Errors
    ///
    /// Fails when the template is not registered.
    pub fn set_loaded_with_errors(
        &mut self,
        id: TemplateId,
        loaded_with_errors: bool,
    ) -> Result<(), RegistryError> {
        let template = self.templates.get_mut(&id).ok_or(RegistryError::TemplateNotFound(id))?;
        if template.loaded_with_errors != loaded_with_errors {
            template.loaded_with_errors = loaded_with_errors;
            notify(&mut self.observers, |observer| {
                observer.loaded_with_errors_changed(id, loaded_with_errors);
            });
        }
        Ok(())
    }

    /// Sets the dirty flag of a template.
    ///
    /// # Errors
    ///
    /// Fails when the template is not registered.
    pub fn set_dirty(&mut self, id: TemplateId, dirty: bool) -> Result<(), RegistryError> {
        let template = self.templates.get_mut(&id).ok_or(RegistryError::TemplateNotFound(id))?;
        if template.dirty != dirty {
            template.dirty = dirty;
            notify(&mut self.observers, |observer| observer.dirty_changed(id, dirty));
        }
        Ok(())
    }

    /// Mutable access to a template DOM for in-place normalization.
    pub(crate) fn template_dom_mut(&mut self, id: TemplateId) -> Option<&mut Value> {
        self.templates.get_mut(&id).map(Template::dom_mut)
    }

    /// Evicts a template together with every link touching it.
    ///
    /// Templates that embedded the evicted one keep their expanded instance
    /// value, lose its `link_id` member, and are marked dirty.
    ///
    /// # Errors
    ///
    /// Fails when the template is not registered.
    pub fn remove_template(&mut self, id: TemplateId) -> Result<Template, RegistryError> {
        let template = self.templates.remove(&id).ok_or(RegistryError::TemplateNotFound(id))?;
        self.by_path.remove(&template.file_path);

        for link_id in template.sorted_link_ids() {
            if let Some(link) = self.links.remove(&link_id) {
                notify(&mut self.observers, |observer| observer.link_removed(&link));
            }
        }

        let mut sourced: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.source_template_id == id)
            .map(|link| link.id)
            .collect();
        sourced.sort_unstable();
        for link_id in sourced {
            let Some(link) = self.links.remove(&link_id) else {
                continue;
            };
            if let Some(target) = self.templates.get_mut(&link.target_template_id) {
                target.link_ids.remove(&link_id);
                if let Some(instance) =
                    target.dom_mut().pointer_mut(&link.instance_path).and_then(Value::as_object_mut)
                {
                    instance.shift_remove(LINK_ID_MEMBER);
                }
                if !target.dirty {
                    target.dirty = true;
                    let target_id = target.id;
                    notify(&mut self.observers, |observer| observer.dirty_changed(target_id, true));
                }
            }
            notify(&mut self.observers, |observer| observer.link_removed(&link));
        }

        tracing::debug!("Removed template {} ('{}')", id, template.file_path);
        notify(&mut self.observers, |observer| observer.template_removed(&template));
        Ok(template)
    }

    /// Evicts every template and link. Ids are not reused afterwards.
    pub fn remove_all(&mut self) {
        let mut links: Vec<_> = self.links.drain().map(|(_, link)| link).collect();
        links.sort_unstable_by_key(|link| link.id);
        let mut templates: Vec<_> = self.templates.drain().map(|(_, template)| template).collect();
        templates.sort_unstable_by_key(|template| template.id);
        self.by_path.clear();

        for link in &links {
            notify(&mut self.observers, |observer| observer.link_removed(link));
        }
        for template in &templates {
            notify(&mut self.observers, |observer| observer.template_removed(template));
        }
        tracing::debug!("Removed {} templates and {} links", templates.len(), links.len());
    }

    fn graph(&self) -> TemplateGraph {
        TemplateGraph::new(
            self.templates.keys().copied(),
            self.links.values().map(|link| (link.source_template_id, link.target_template_id)),
        )
    }

    /// Every template id, each after all templates it embeds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Cycle`] if the graph is not acyclic, which only
    /// happens when an invariant has been broken.
    pub fn dependency_order(&self) -> Result<Vec<TemplateId>, RegistryError> {
        self.graph().topological_order().map_err(|cycle| RegistryError::Cycle {
            chain: format_chain(&cycle),
        })
    }

    /// Verifies the registry's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvariantViolated`] describing the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        let violated = |message: String| Err(RegistryError::InvariantViolated(message));

        if self.by_path.len() != self.templates.len() {
            return violated(format!(
                "path index has {} entries for {} templates",
                self.by_path.len(),
                self.templates.len()
            ));
        }
        for (path, id) in &self.by_path {
            match self.templates.get(id) {
                Some(template) if template.file_path == *path => {}
                Some(template) => {
                    return violated(format!(
                        "path '{}' maps to template {} whose path is '{}'",
                        path, id, template.file_path
                    ));
                }
                None => return violated(format!("path '{path}' maps to missing template {id}")),
            }
        }

        for template in self.templates() {
            if !is_valid_prefab_path(&template.file_path) {
                return violated(format!("template {} has invalid path '{}'", template.id, template.file_path));
            }
            if !template.is_valid() {
                return violated(format!("template {} is not valid", template.id));
            }
            for link_id in template.sorted_link_ids() {
                match self.links.get(&link_id) {
                    Some(link) if link.target_template_id == template.id => {}
                    Some(link) => {
                        return violated(format!(
                            "template {} lists link {} which targets template {}",
                            template.id, link_id, link.target_template_id
                        ));
                    }
                    None => {
                        return violated(format!("template {} lists missing link {}", template.id, link_id));
                    }
                }
            }
        }

        let mut links: Vec<_> = self.links.values().collect();
        links.sort_unstable_by_key(|link| link.id);
        for link in links {
            if !self.templates.contains_key(&link.source_template_id) {
                return violated(format!(
                    "link {} has missing source template {}",
                    link.id, link.source_template_id
                ));
            }
            let Some(target) = self.templates.get(&link.target_template_id) else {
                return violated(format!(
                    "link {} has missing target template {}",
                    link.id, link.target_template_id
                ));
            };
            if !target.link_ids.contains(&link.id) {
                return violated(format!("template {} does not list its link {}", target.id, link.id));
            }
            if !link.is_valid() {
                return violated(format!("link {} is not valid", link.id));
            }
        }

        if let Some(cycle) = self.graph().find_cycle() {
            return violated(format!("template graph contains a cycle: {}", format_chain(&cycle)));
        }
        Ok(())
    }
}

fn is_empty_patch_list(patches: &Value) -> bool {
    match patches {
        Value::Null => true,
        Value::Array(operations) => operations.is_empty(),
        _ => false,
    }
}
