//! Error types for the [`transfer`](super) module.
//!
//! Each variant names the phase of a move that failed, and with it what is
//! left on disk. Callers turn these into distinct messages.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A move error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for move operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing to move. Nothing was touched.
    #[display("source path is invalid: {}", _0.display())]
    SourcePathInvalid(#[error(not(source))] PathBuf),
    /// Something already occupies the destination. Nothing was touched.
    #[display("destination path already in use: {}", _0.display())]
    DestinationPathAlreadyInUse(#[error(not(source))] PathBuf),
    /// Reading the source or writing the destination failed. The source is
    /// intact and no partial destination is left behind.
    #[display("failed to copy file to {}", _0.display())]
    FailedToCopyFile(#[error(not(source))] PathBuf),
    /// The copy landed but the source could not be removed: the file now
    /// exists at both paths. Never cleaned up automatically.
    #[display("failed to delete file {}", _0.display())]
    FailedToDeleteFile(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FailedToCopyFile(_))
    }
}
