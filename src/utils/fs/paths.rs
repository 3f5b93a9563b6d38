//! Lexical path utilities.
//!
//! Everything here works on path text only: nothing touches the filesystem,
//! resolves symbolic links, or checks existence.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// This function cleans up path components by:
/// - Removing `.` (current directory) components
/// - Resolving `..` against the previous normal component
/// - Keeping leading `..` components of relative paths
/// - Maintaining the path's absolute or relative nature
///
/// # Examples
///
/// ```rust,no_run
/// use prefab_loader::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/foo/./bar/../baz");
/// assert_eq!(normalize_path(path), PathBuf::from("/foo/baz"));
///
/// let relative = Path::new("../levels/./town.prefab");
/// assert_eq!(normalize_path(relative), PathBuf::from("../levels/town.prefab"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Computes `path` relative to `base` without touching the filesystem.
///
/// Both paths are normalized first. When `path` is not under `base`, the result
/// climbs out with `..` components. Returns `None` when the two paths cannot be
/// related (one absolute and one relative, or different prefixes on Windows).
///
/// # Examples
///
/// ```rust,no_run
/// use prefab_loader::utils::fs::lexically_relative;
/// use std::path::{Path, PathBuf};
///
/// let rel = lexically_relative(Path::new("/project/levels/a.prefab"), Path::new("/project"));
/// assert_eq!(rel, Some(PathBuf::from("levels/a.prefab")));
///
/// let outside = lexically_relative(Path::new("/gems/b.prefab"), Path::new("/project"));
/// assert_eq!(outside, Some(PathBuf::from("../gems/b.prefab")));
/// ```
#[must_use]
pub fn lexically_relative(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path = normalize_path(path);
    let base = normalize_path(base);

    let path_components: Vec<_> = path.components().collect();
    let base_components: Vec<_> = base.components().collect();

    if let (Some(Component::Prefix(a)), Some(Component::Prefix(b))) =
        (path_components.first(), base_components.first())
        && a != b
    {
        return None;
    }

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }

    Some(relative)
}

/// Renders a path with `/` separators regardless of platform.
///
/// Backslashes are converted too, so Windows-style input produces the same key
/// on every platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let mut out = String::with_capacity(text.len());
    let mut previous_slash = false;
    for ch in text.chars() {
        if ch == '/' {
            if !previous_slash {
                out.push(ch);
            }
            previous_slash = true;
        } else {
            out.push(ch);
            previous_slash = false;
        }
    }
    out
}

/// Reports whether a path is absolute on this platform or looks like a
/// Windows drive path (`C:\`, `C:/`).
#[must_use]
pub fn is_absolute_like(path: &str) -> bool {
    if Path::new(path).is_absolute() {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}
