//! Fat/thin normalization of prefab DOMs.
//!
//! Prefabs are stored on disk with default values stripped so that files stay
//! small and diffs stay minimal. In memory every default is spelled out, so that
//! override patches address the same members no matter which defaults the
//! source file happened to omit.
//!
//! Both passes work the same way: read the DOM into the typed
//! [`PrefabModel`](model::PrefabModel), then write it back in the requested
//! [`StoreMode`]. Link ids on nested instances survive both passes.
//!
//! | Pass | Used | Output |
//! |------|------|--------|
//! | [`inflate`] | after every load | fat: defaults materialized |
//! | [`deflate`] | right before every save | thin: defaults stripped |
//!
//! Neither pass performs I/O. On failure the input DOM is left untouched.

pub mod model;

use serde_json::Value;
use thiserror::Error;

pub use model::{EntityModel, PrefabModel, TransformModel};

/// How defaults are treated when writing a model back to a DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Write every member, including those equal to their default.
    MaterializeDefaults,
    /// Omit members equal to their default.
    StripDefaults,
}

/// Failure reading a DOM into the document model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// A member has an unexpected shape.
    #[error("invalid document at '{location}': {reason}")]
    InvalidDocument {
        /// JSON pointer of the offending member (empty for the root)
        location: String,
        /// What was wrong
        reason: String,
    },
}

impl NormalizationError {
    pub(crate) fn invalid(location: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            location: location.to_string(),
            reason: reason.into(),
        }
    }
}

/// Rewrites `dom` in fat form (every default materialized).
///
/// # Errors
///
/// Returns [`NormalizationError`] when the DOM does not fit the document model;
/// `dom` is unchanged in that case.
pub fn inflate(dom: &mut Value) -> Result<(), NormalizationError> {
    normalize(dom, StoreMode::MaterializeDefaults)
}

/// Rewrites `dom` in thin form (defaults stripped).
///
/// # Errors
///
/// Returns [`NormalizationError`] when the DOM does not fit the document model;
/// `dom` is unchanged in that case.
pub fn deflate(dom: &mut Value) -> Result<(), NormalizationError> {
    normalize(dom, StoreMode::StripDefaults)
}

/// Rewrites `dom` in the given mode.
///
/// # Errors
///
/// See [`inflate`] and [`deflate`].
pub fn normalize(dom: &mut Value, mode: StoreMode) -> Result<(), NormalizationError> {
    let model = PrefabModel::from_value(dom)?;
    *dom = model.to_value(mode);
    Ok(())
}
