//! Error handling for the prefab loader
//!
//! This module provides the tagged error type returned by every public loader and
//! saver operation. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on the failure kind
//! 2. **Originating path in every message** so the editor can point at the broken file
//!
//! # Error Categories
//!
//! - **Paths**: [`PrefabError::InvalidPath`], [`PrefabError::PathMismatch`]
//! - **Documents**: [`PrefabError::Io`], [`PrefabError::Parse`], [`PrefabError::Normalization`]
//! - **Graph**: [`PrefabError::CyclicDependency`], [`PrefabError::DepthExceeded`],
//!   [`PrefabError::LinkIntegrity`]
//! - **Registry**: [`PrefabError::DuplicateOrRegistry`], [`PrefabError::TemplateNotFound`],
//!   [`PrefabError::InvalidTemplate`]
//!
//! Lower layers report their own error types ([`RegistryError`](crate::registry::RegistryError),
//! [`NormalizationError`](crate::normalize::NormalizationError),
//! [`PatchError`](crate::patch::PatchError)); the loader converts them at its boundary,
//! attaching the path it was working on.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefab_loader::core::{PrefabError, PrefabErrorKind};
//!
//! fn report(err: &PrefabError) {
//!     match err.kind() {
//!         PrefabErrorKind::CyclicDependency => eprintln!("cycle: {err}"),
//!         PrefabErrorKind::Io | PrefabErrorKind::Parse => eprintln!("broken file: {err}"),
//!         _ => eprintln!("{err}"),
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::registry::{LinkId, TemplateId};

/// Convenience alias used throughout the loader.
pub type Result<T, E = PrefabError> = std::result::Result<T, E>;

/// The error type for load and save operations.
///
/// Every variant carries the originating path (relative or absolute, whichever the
/// failing step was working with) so the message can be shown to users unchanged.
#[derive(Error, Debug)]
pub enum PrefabError {
    /// The path is empty, contains an OS-invalid character, or ends in a separator.
    #[error("Invalid prefab path: '{path}'")]
    InvalidPath {
        /// The rejected path as given by the caller
        path: String,
    },

    /// Reading or writing the document failed.
    #[error("Failed to {operation} prefab file '{}': {source}", path.display())]
    Io {
        /// "read" or "write"
        operation: &'static str,
        /// Absolute path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The bytes did not form a JSON object document.
    #[error("Failed to parse prefab document '{path}': {reason}")]
    Parse {
        /// Relative path of the document
        path: String,
        /// Parser message, including line and column when known
        reason: String,
    },

    /// The document depends on itself, directly or through other documents.
    #[error("Prefab '{path}' directly or indirectly depends on itself: {chain}")]
    CyclicDependency {
        /// Relative path that closed the cycle
        path: String,
        /// The chain of documents forming the cycle, joined with arrows
        chain: String,
    },

    /// The registry rejected the new template.
    #[error("Failed to register template for '{path}': {reason}")]
    DuplicateOrRegistry {
        /// Relative path of the document
        path: String,
        /// Registry message
        reason: String,
    },

    /// Inflating or deflating the document failed.
    #[error("Failed to normalize prefab '{path}': {reason}")]
    Normalization {
        /// Relative path of the document
        path: String,
        /// Normalization message
        reason: String,
    },

    /// Saving found a dangling or inconsistent link.
    #[error("Link {link_id} of template '{path}' is unusable: {reason}")]
    LinkIntegrity {
        /// Relative path of the template being saved
        path: String,
        /// The offending link
        link_id: LinkId,
        /// What was wrong with it
        reason: String,
    },

    /// The save location does not resolve to the template's registered path.
    #[error("Cannot save template '{expected}' to '{}': location resolves to '{actual}'", location.display())]
    PathMismatch {
        /// Relative path recorded in the template
        expected: String,
        /// Relative path the requested location resolves to
        actual: String,
        /// The requested absolute location
        location: PathBuf,
    },

    /// Nesting went deeper than the configured limit.
    #[error("Prefab '{path}' exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// Relative path of the document that would exceed the limit
        path: String,
        /// Configured limit
        max_depth: usize,
    },

    /// No template is registered under the id.
    #[error("Template {template_id} could not be found")]
    TemplateNotFound {
        /// Requested id
        template_id: TemplateId,
    },

    /// The template exists but is not in a saveable state.
    #[error("Template {template_id} ('{path}') is invalid")]
    InvalidTemplate {
        /// Requested id
        template_id: TemplateId,
        /// Relative path of the template
        path: String,
    },
}

/// Discriminant of [`PrefabError`] for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefabErrorKind {
    /// See [`PrefabError::InvalidPath`]
    InvalidPath,
    /// See [`PrefabError::Io`]
    Io,
    /// See [`PrefabError::Parse`]
    Parse,
    /// See [`PrefabError::CyclicDependency`]
    CyclicDependency,
    /// See [`PrefabError::DuplicateOrRegistry`]
    DuplicateOrRegistry,
    /// See [`PrefabError::Normalization`]
    Normalization,
    /// See [`PrefabError::LinkIntegrity`]
    LinkIntegrity,
    /// See [`PrefabError::PathMismatch`]
    PathMismatch,
    /// See [`PrefabError::DepthExceeded`]
    DepthExceeded,
    /// See [`PrefabError::TemplateNotFound`]
    TemplateNotFound,
    /// See [`PrefabError::InvalidTemplate`]
    InvalidTemplate,
}

impl PrefabError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> PrefabErrorKind {
        match self {
            Self::InvalidPath {
                ..
            } => PrefabErrorKind::InvalidPath,
            Self::Io {
                ..
            } => PrefabErrorKind::Io,
            Self::Parse {
                ..
            } => PrefabErrorKind::Parse,
            Self::CyclicDependency {
                ..
            } => PrefabErrorKind::CyclicDependency,
            Self::DuplicateOrRegistry {
                ..
            } => PrefabErrorKind::DuplicateOrRegistry,
            Self::Normalization {
                ..
            } => PrefabErrorKind::Normalization,
            Self::LinkIntegrity {
                ..
            } => PrefabErrorKind::LinkIntegrity,
            Self::PathMismatch {
                ..
            } => PrefabErrorKind::PathMismatch,
            Self::DepthExceeded {
                ..
            } => PrefabErrorKind::DepthExceeded,
            Self::TemplateNotFound {
                ..
            } => PrefabErrorKind::TemplateNotFound,
            Self::InvalidTemplate {
                ..
            } => PrefabErrorKind::InvalidTemplate,
        }
    }

    /// Builds an [`PrefabError::Io`] for a failed read.
    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: "read",
            path: path.into(),
            source,
        }
    }

    /// Builds an [`PrefabError::Io`] for a failed write.
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: "write",
            path: path.into(),
            source,
        }
    }

    /// Builds an [`PrefabError::InvalidPath`].
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
        }
    }
}
