//! Raw document access: bytes on disk and the JSON DOM.
//!
//! The loader talks to storage only through the [`DocumentStore`] trait, so the
//! same recursive load can run against the real filesystem ([`FsDocumentStore`])
//! or an in-memory map ([`MemoryDocumentStore`]). Parsing and serialization are
//! free functions: they never mutate the DOM in-band.
//!
//! # Format
//!
//! Documents are JSON objects. [`serialize`] writes them pretty-printed with a
//! four-space indent, members in document order, and a trailing newline, so the
//! output is byte-for-byte stable for equal DOMs.

mod fs_store;
mod memory_store;

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

pub use fs_store::FsDocumentStore;
pub use memory_store::MemoryDocumentStore;

use crate::core::{PrefabError, Result};

/// Byte-level storage for prefab documents.
///
/// Implementations must release any handle they acquire before returning,
/// including on error paths.
pub trait DocumentStore {
    /// Reads the whole document at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replaces the document at `path` with `bytes`.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        (**self).write(path, bytes)
    }
}

/// Parses document bytes into a DOM.
///
/// The top-level value must be a JSON object. `origin` is only used for the
/// error message.
///
/// # Errors
///
/// Returns [`PrefabError::Parse`] for invalid UTF-8, invalid JSON, or a
/// non-object top-level value.
pub fn parse(bytes: &[u8], origin: &str) -> Result<Value> {
    let dom: Value = serde_json::from_slice(bytes).map_err(|err| PrefabError::Parse {
        path: origin.to_string(),
        reason: err.to_string(),
    })?;

    if !dom.is_object() {
        return Err(PrefabError::Parse {
            path: origin.to_string(),
            reason: format!("document root must be a JSON object, found {}", kind_name(&dom)),
        });
    }

    Ok(dom)
}

/// Serializes a DOM to its canonical text form.
///
/// Four-space indentation, member order preserved, trailing newline.
pub fn serialize(dom: &Value) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);
    {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        dom.serialize(&mut serializer)?;
    }
    out.push(b'\n');
    Ok(out)
}

/// Human-readable name of a JSON value's type, for error messages.
pub(crate) const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
