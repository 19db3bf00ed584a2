//! Path validation and security utilities.
//!
//! Callers hand us folder and file names straight off the wire, so every
//! path is normalized and checked here before it gets joined onto a root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use filer_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("A/Acme/2024/invoice1.pdf").is_ok());
/// assert!(validate_path("A/../B/Beta").is_ok()); // (never leaves the root)
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("A/../../B").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("A/./Acme//2024/").unwrap(),
///     Path::new("A/Acme/2024")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates a single folder or file name (one path segment).
///
/// Letters, category names and years all name exactly one directory level.
/// Anything that would normalize to more or fewer than one segment, or to a
/// different string than it started as, is rejected.
///
/// ```
/// use filer_storage::validate_name;
/// assert!(validate_name("Acme Ltd").is_ok());
/// assert!(validate_name("2024").is_ok());
/// assert!(validate_name("A/Acme").is_err());
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<&str> {
    let validated = validate(name)?;
    match validated.as_os_str() == name {
        true => Ok(name),
        false => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}
