//! Engine Error Types
//!
//! Errors raised while preparing a namespace or carrying out one step of an
//! operation. Operations themselves never return these: every public
//! operation converts its failure into an [`Outcome`](crate::Outcome) after
//! logging the full error tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an engine failure.
///
/// ### Startup Errors
/// - [`ErrorKind::Roots`]
/// - [`ErrorKind::Topology`]
/// - [`ErrorKind::NoNamespaces`]
///
/// ### Operational Errors
/// - [`ErrorKind::InvalidName`]
/// - [`ErrorKind::YearFolder`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configured roots are missing, identical or nested.
    #[display("invalid namespace roots: {_0}")]
    Roots(#[error(not(source))] String),
    /// The letter buckets could not be brought into existence.
    #[display("letter buckets could not be created")]
    Topology,
    /// Not a single configured namespace could be opened.
    #[display("no namespace could be opened")]
    NoNamespaces,
    /// A caller-supplied name is not exactly one path segment.
    #[display("invalid name: {_0:?}")]
    InvalidName(#[error(not(source))] String),
    /// The year folder under a category could not be created.
    #[display("year folder could not be created: {}", _0.display())]
    YearFolder(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::YearFolder(_))
    }
}
