//! Override patches for nested instances.
//!
//! A nested instance stores its overrides as an RFC 6902 operation array in the
//! `patches` member of its on-disk reference. When a link is created the
//! registry expands the instance by copying the source template's DOM and
//! applying those operations with [`apply_patches`].
//!
//! Supported operations: `add`, `remove`, `replace`, `move`, `copy`, `test`.
//! Paths are RFC 6901 JSON pointers; `-` as the last array token appends.
//! Application is all-or-nothing: when any operation fails the document is
//! left exactly as it was.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefab_loader::patch::apply_patches;
//! use serde_json::json;
//!
//! let mut dom = json!({"entities": {"Lamp": {"name": "Lamp"}}});
//! let patches = json!([
//!     {"op": "replace", "path": "/entities/Lamp/name", "value": "Street Lamp"},
//!     {"op": "add", "path": "/entities/Lamp/active", "value": false}
//! ]);
//! apply_patches(&mut dom, &patches).unwrap();
//! assert_eq!(dom["entities"]["Lamp"]["name"], "Street Lamp");
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Failure applying a patch array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// `patches` was neither an array nor null.
    #[error("patches must be an array")]
    NotAnArray,

    /// An operation object is missing a member or has the wrong shape.
    #[error("patch operation {index} is malformed: {reason}")]
    MalformedOperation {
        /// Position of the operation in the array
        index: usize,
        /// What was wrong
        reason: String,
    },

    /// The `op` member names an operation that is not supported.
    #[error("patch operation {index} has unknown op '{op}'")]
    UnknownOperation {
        /// Position of the operation in the array
        index: usize,
        /// The unrecognized op name
        op: String,
    },

    /// A pointer is not a valid RFC 6901 pointer.
    #[error("invalid JSON pointer '{pointer}'")]
    InvalidPointer {
        /// The offending pointer text
        pointer: String,
    },

    /// A pointer does not resolve in the document.
    #[error("patch operation {index}: path '{path}' does not exist")]
    PathNotFound {
        /// Position of the operation in the array
        index: usize,
        /// The unresolved pointer
        path: String,
    },

    /// A `test` operation found a different value.
    #[error("patch operation {index}: test failed at '{path}'")]
    TestFailed {
        /// Position of the operation in the array
        index: usize,
        /// The tested pointer
        path: String,
    },
}

/// Applies an RFC 6902 patch array to `doc`.
///
/// `null` means "no patches". The document is only modified when every
/// operation succeeds.
///
/// # Errors
///
/// Returns the first [`PatchError`] encountered; `doc` is unchanged in that case.
pub fn apply_patches(doc: &mut Value, patches: &Value) -> Result<(), PatchError> {
    let operations = match patches {
        Value::Null => return Ok(()),
        Value::Array(operations) => operations,
        _ => return Err(PatchError::NotAnArray),
    };

    if operations.is_empty() {
        return Ok(());
    }

    let mut working = doc.clone();
    for (index, operation) in operations.iter().enumerate() {
        apply_operation(&mut working, index, operation)?;
    }

    *doc = working;
    Ok(())
}

/// Escapes a member name for use as a JSON pointer token (`~` → `~0`, `/` → `~1`).
#[must_use]
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Builds a JSON pointer from unescaped tokens.
#[must_use]
pub fn pointer_from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    tokens.into_iter().fold(String::new(), |mut pointer, token| {
        pointer.push('/');
        pointer.push_str(&escape_pointer_token(token));
        pointer
    })
}

/// Splits a JSON pointer into unescaped tokens.
///
/// # Errors
///
/// Returns [`PatchError::InvalidPointer`] when the pointer is non-empty and does
/// not start with `/`, or contains a `~` not followed by `0` or `1`.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };

    rest.split('/')
        .map(|raw| {
            let mut token = String::with_capacity(raw.len());
            let mut chars = raw.chars();
            while let Some(c) = chars.next() {
                if c == '~' {
                    match chars.next() {
                        Some('0') => token.push('~'),
                        Some('1') => token.push('/'),
                        _ => {
                            return Err(PatchError::InvalidPointer {
                                pointer: pointer.to_string(),
                            });
                        }
                    }
                } else {
                    token.push(c);
                }
            }
            Ok(token)
        })
        .collect()
}

fn apply_operation(doc: &mut Value, index: usize, operation: &Value) -> Result<(), PatchError> {
    let Some(fields) = operation.as_object() else {
        return Err(malformed(index, "operation is not an object"));
    };

    let op = string_member(fields, "op", index)?;
    let path = string_member(fields, "path", index)?;
    let tokens = parse_pointer(path)?;

    match op {
        "add" => {
            let value = value_member(fields, index)?;
            add(doc, &tokens, value.clone(), index, path)
        }
        "remove" => remove(doc, &tokens, index, path).map(|_| ()),
        "replace" => {
            let value = value_member(fields, index)?;
            let target = resolve_mut(doc, &tokens).ok_or_else(|| not_found(index, path))?;
            *target = value.clone();
            Ok(())
        }
        "move" => {
            let from = string_member(fields, "from", index)?;
            let from_tokens = parse_pointer(from)?;
            if tokens.len() > from_tokens.len() && tokens.starts_with(&from_tokens) {
                return Err(malformed(index, "cannot move a value into one of its children"));
            }
            let value = remove(doc, &from_tokens, index, from)?;
            add(doc, &tokens, value, index, path)
        }
        "copy" => {
            let from = string_member(fields, "from", index)?;
            let from_tokens = parse_pointer(from)?;
            let value = resolve(doc, &from_tokens).ok_or_else(|| not_found(index, from))?.clone();
            add(doc, &tokens, value, index, path)
        }
        "test" => {
            let value = value_member(fields, index)?;
            match resolve(doc, &tokens) {
                Some(actual) if actual == value => Ok(()),
                Some(_) => Err(PatchError::TestFailed {
                    index,
                    path: path.to_string(),
                }),
                None => Err(not_found(index, path)),
            }
        }
        other => Err(PatchError::UnknownOperation {
            index,
            op: other.to_string(),
        }),
    }
}

fn add(
    doc: &mut Value,
    tokens: &[String],
    value: Value,
    index: usize,
    path: &str,
) -> Result<(), PatchError> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };

    let parent = resolve_mut(doc, parent_tokens).ok_or_else(|| not_found(index, path))?;
    match parent {
        Value::Object(members) => {
            members.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let position = array_index(last).filter(|i| *i <= items.len());
            let position = position.ok_or_else(|| not_found(index, path))?;
            items.insert(position, value);
            Ok(())
        }
        _ => Err(not_found(index, path)),
    }
}

fn remove(doc: &mut Value, tokens: &[String], index: usize, path: &str) -> Result<Value, PatchError> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        return Err(malformed(index, "cannot remove the document root"));
    };

    let parent = resolve_mut(doc, parent_tokens).ok_or_else(|| not_found(index, path))?;
    match parent {
        // shift_remove keeps the remaining members in document order
        Value::Object(members) => members.shift_remove(last).ok_or_else(|| not_found(index, path)),
        Value::Array(items) => {
            let position = array_index(last).filter(|i| *i < items.len());
            let position = position.ok_or_else(|| not_found(index, path))?;
            Ok(items.remove(position))
        }
        _ => Err(not_found(index, path)),
    }
}

fn resolve<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(members) => members.get(token),
        Value::Array(items) => array_index(token).and_then(|i| items.get(i)),
        _ => None,
    })
}

fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(members) => members.get_mut(token),
        Value::Array(items) => array_index(token).and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

fn array_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn string_member<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
    index: usize,
) -> Result<&'a str, PatchError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(index, &format!("missing string member '{name}'")))
}

fn value_member(fields: &Map<String, Value>, index: usize) -> Result<&Value, PatchError> {
    fields.get("value").ok_or_else(|| malformed(index, "missing member 'value'"))
}

fn malformed(index: usize, reason: &str) -> PatchError {
    PatchError::MalformedOperation {
        index,
        reason: reason.to_string(),
    }
}

fn not_found(index: usize, path: &str) -> PatchError {
    PatchError::PathNotFound {
        index,
        path: path.to_string(),
    }
}
