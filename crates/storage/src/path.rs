//! Path validation for library lookups.
//!
//! Collection and chapter names arrive from callers (URLs, CLI arguments) and
//! end up joined onto the library root. Everything here exists so that a name
//! can never reach outside of that root.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Leading character of names that are hidden from every listing.
const HIDDEN_PREFIX: char = '.';

/// Returns `true` for names that listings must skip (dotfiles such as
/// `.DS_Store` or `.thumbnails`).
///
/// ```
/// use shelf_storage::is_hidden;
/// assert!(is_hidden(".DS_Store"));
/// assert!(!is_hidden("1.png"));
/// ```
pub fn is_hidden(name: impl AsRef<OsStr>) -> bool {
    name.as_ref().to_string_lossy().starts_with(HIDDEN_PREFIX)
}

/// Validates a relative library path, resolving `.` and `..` without ever
/// leaving the library root.
///
/// > **Note:** Null bytes are rejected since they truncate paths in C-based
/// >           syscalls.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelf_storage::validate_path;
/// assert!(validate_path("one-piece/1 - Romance Dawn").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert_eq!(validate_path("one-piece/./2/../1").unwrap(), Path::new("one-piece/1"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut resolved = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) if s.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(s) => resolved.push(s),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if resolved.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if resolved.is_empty() {
        exn::bail!(invalid());
    }
    Ok(resolved.into_iter().collect())
}

/// Validates a single name (a collection slug or a chapter name): it must be
/// exactly one plain path component.
///
/// ```
/// use shelf_storage::validate_segment;
/// assert!(validate_segment("12 - Extra").is_ok());
/// assert!(validate_segment("a/b").is_err());
/// assert!(validate_segment("..").is_err());
/// ```
pub fn validate_segment(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if !s.as_encoded_bytes().contains(&0) && s == name => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_names() {
        assert!(is_hidden(".hidden"));
        assert!(is_hidden("."));
        assert!(!is_hidden("visible.png"));
        assert!(!is_hidden(""));
    }

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate("berserk/1/1.png").unwrap(), Path::new("berserk/1/1.png"));
        assert_eq!(validate("berserk//1/").unwrap(), Path::new("berserk/1"));
        assert_eq!(validate("./berserk").unwrap(), Path::new("berserk"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate("../secret").is_err());
        assert!(validate("berserk/../../secret").is_err());
        assert!(validate("..").is_err());
        // Stays inside the root.
        assert_eq!(validate("berserk/1/..").unwrap(), Path::new("berserk"));
    }

    #[test]
    fn test_empty_and_null() {
        assert!(validate("").is_err());
        assert!(validate("./").is_err());
        assert!(validate("a\0b").is_err());
    }

    #[test]
    fn test_segments() {
        assert_eq!(validate_segment("berserk").unwrap(), "berserk");
        assert_eq!(validate_segment("Extra Chapter").unwrap(), "Extra Chapter");
        assert!(validate_segment("").is_err());
        assert!(validate_segment(".").is_err());
        assert!(validate_segment("berserk/1").is_err());
        assert!(validate_segment("/berserk").is_err());
        assert!(validate_segment("berserk/").is_err());
        assert!(validate_segment("nul\0").is_err());
    }
}
