use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use super::LinkId;
use crate::normalize::model::INSTANCES_MEMBER;

/// Identifier of a template in a [`TemplateRegistry`](super::TemplateRegistry).
///
/// Ids are issued by the registry, start at 1, and are never reused within a
/// registry. [`TemplateId::INVALID`] (0) is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u64);

impl TemplateId {
    /// The id no template ever has.
    pub const INVALID: Self = Self(0);

    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is not [`TemplateId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The in-memory form of one prefab document.
///
/// The DOM is always in fat form, carries a root `source` member equal to
/// [`file_path`](Self::file_path), and holds every nested instance expanded.
/// External code only ever sees it read-only.
#[derive(Debug, Clone)]
pub struct Template {
    pub(super) id: TemplateId,
    pub(super) file_path: String,
    pub(super) dom: Value,
    pub(super) loaded_with_errors: bool,
    pub(super) dirty: bool,
    pub(super) link_ids: HashSet<LinkId>,
}

impl Template {
    pub(super) fn new(id: TemplateId, file_path: String, dom: Value) -> Self {
        Self {
            id,
            file_path,
            dom,
            loaded_with_errors: false,
            dirty: false,
            link_ids: HashSet::new(),
        }
    }

    /// Registry id.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Canonical relative path; the registry key.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// The template's DOM.
    #[must_use]
    pub const fn dom(&self) -> &Value {
        &self.dom
    }

    /// A template is valid when it has a path and an object DOM.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id.is_valid() && !self.file_path.is_empty() && self.dom.is_object()
    }

    /// Whether at least one transitively referenced document failed to load.
    #[must_use]
    pub const fn is_loaded_with_errors(&self) -> bool {
        self.loaded_with_errors
    }

    /// Whether the template has unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Links whose target is this template.
    #[must_use]
    pub const fn link_ids(&self) -> &HashSet<LinkId> {
        &self.link_ids
    }

    /// [`link_ids`](Self::link_ids) in ascending order.
    #[must_use]
    pub fn sorted_link_ids(&self) -> Vec<LinkId> {
        let mut ids: Vec<_> = self.link_ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The `instances` member of the DOM, if present and an object.
    #[must_use]
    pub fn instances(&self) -> Option<&Map<String, Value>> {
        self.dom.get(INSTANCES_MEMBER).and_then(Value::as_object)
    }

    pub(super) fn dom_mut(&mut self) -> &mut Value {
        &mut self.dom
    }
}
