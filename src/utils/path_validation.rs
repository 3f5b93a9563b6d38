//! Path validation for prefab registry keys and instance names.
//!
//! The same rule applies to document paths and to nested instance member names:
//! the text must be non-empty, must not contain a character that is invalid in a
//! file name on any supported platform, and must not end in a path separator.

/// Characters that are invalid in file names on at least one supported platform.
pub const INVALID_PATH_CHARACTERS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Checks whether a path (or instance name) is acceptable as a prefab key.
///
/// Rejects:
/// - empty text
/// - any of [`INVALID_PATH_CHARACTERS`] or a control character below U+0020
/// - text whose last character is `/` or `\`
///
/// Drive-letter paths such as `C:\project\town.prefab` are rejected by the `:`
/// rule; absolute Windows paths have to be made relative before they become keys.
///
/// # Examples
///
/// ```rust,no_run
/// use prefab_loader::utils::path_validation::is_valid_prefab_path;
///
/// assert!(is_valid_prefab_path("levels/town.prefab"));
/// assert!(!is_valid_prefab_path(""));
/// assert!(!is_valid_prefab_path("levels/"));
/// assert!(!is_valid_prefab_path("what?.prefab"));
/// ```
#[must_use]
pub fn is_valid_prefab_path(path: &str) -> bool {
    let Some(last) = path.chars().last() else {
        return false;
    };

    if last == '/' || last == '\\' {
        return false;
    }

    !path.chars().any(|c| INVALID_PATH_CHARACTERS.contains(&c) || c < '\u{20}')
}
