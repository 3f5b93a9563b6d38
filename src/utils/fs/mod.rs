//! File system utilities
//!
//! This module provides the atomic write used when saving documents and the
//! lexical path helpers used by the path normalizer. All functions handle
//! platform differences such as path separators.
//!
//! # Examples
//!
//! ```rust,no_run
//! use prefab_loader::utils::fs::{atomic_write, normalize_path};
//! use std::path::Path;
//!
//! # fn example() -> std::io::Result<()> {
//! let target = normalize_path(Path::new("output/./levels/town.prefab"));
//! atomic_write(&target, b"{}\n")?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod paths;

// Atomic write operations
pub use atomic::{atomic_write, safe_write};

// Path utilities
pub use paths::{is_absolute_like, lexically_relative, normalize_path, to_slash};
