//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Higher layers wrap these with their own kinds via
//! [`or_raise`](exn::ResultExt::or_raise) and match on the kind through
//! `Deref` when the distinction matters (missing vs. occupied vs. non-empty).

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied by the operating system
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Something already occupies the path (writes never overwrite)
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Directory still has children and cannot be removed
    #[display("directory not empty: {}", _0.display())]
    NotEmpty(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound(PathBuf::from("A/Acme")).to_string(), "not found: A/Acme");
        assert_eq!(
            ErrorKind::NotEmpty(Path::new("B/Beta").to_path_buf()).to_string(),
            "directory not empty: B/Beta"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::AlreadyExists(PathBuf::from("x.pdf")).is_retryable());
        assert!(!ErrorKind::InvalidPath(PathBuf::from("../x")).is_retryable());
        assert!(ErrorKind::BackendError("flaky".to_string()).is_retryable());
    }
}
