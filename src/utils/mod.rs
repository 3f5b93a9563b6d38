//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes and lexical path manipulation
//! - [`path_validation`] - Validity rules for registry keys and instance names
//!
//! # Cross-Platform Considerations
//!
//! Registry keys always use `/` separators. Input paths may use either separator;
//! they are converted before becoming keys.

pub mod fs;
pub mod path_validation;

pub use fs::{atomic_write, normalize_path, to_slash};
pub use path_validation::is_valid_prefab_path;
