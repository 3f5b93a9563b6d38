use std::fmt;

use serde_json::Value;

use super::TemplateId;
use crate::normalize::model::{PATCHES_MEMBER, SOURCE_MEMBER};
use crate::patch::parse_pointer;

/// Identifier of a link in a [`TemplateRegistry`](super::TemplateRegistry).
///
/// Issued in creation order starting at 1; [`LinkId::INVALID`] (0) is never
/// issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

impl LinkId {
    /// The id no link ever has.
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

    /// Whether this is not [`LinkId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge: the target template embeds the source template.
///
/// `instance_path` points at the nested instance inside the target DOM and
/// `link_dom` is what that instance collapses to on disk:
/// `{"source": <source path>, "patches": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(super) id: LinkId,
    pub(super) source_template_id: TemplateId,
    pub(super) target_template_id: TemplateId,
    pub(super) instance_path: String,
    pub(super) link_dom: Value,
}

impl Link {
    /// Registry id.
    #[must_use]
    pub const fn id(&self) -> LinkId {
        self.id
    }

    /// The embedded (referenced) template.
    #[must_use]
    pub const fn source_template_id(&self) -> TemplateId {
        self.source_template_id
    }

    /// The embedding (referencing) template.
    #[must_use]
    pub const fn target_template_id(&self) -> TemplateId {
        self.target_template_id
    }

    /// JSON pointer of the nested instance in the target DOM.
    #[must_use]
    pub fn instance_path(&self) -> &str {
        &self.instance_path
    }

    /// Collapsed on-disk form of the nested instance.
    #[must_use]
    pub const fn link_dom(&self) -> &Value {
        &self.link_dom
    }

    /// Override patches carried by the link; `Null` when there are none.
    #[must_use]
    pub fn patches(&self) -> &Value {
        self.link_dom.get(PATCHES_MEMBER).unwrap_or(&Value::Null)
    }

    /// Name of the nested instance (last pointer token).
    #[must_use]
    pub fn instance_name(&self) -> Option<String> {
        parse_pointer(&self.instance_path).ok()?.pop()
    }

    /// A link is valid when both ids are valid, the instance path is a
    /// non-root pointer, and the link DOM names a source.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
            && self.source_template_id.is_valid()
            && self.target_template_id.is_valid()
            && self.instance_path.starts_with('/')
            && parse_pointer(&self.instance_path).is_ok()
            && self
                .link_dom
                .get(SOURCE_MEMBER)
                .and_then(Value::as_str)
                .is_some_and(|source| !source.is_empty())
    }
}
