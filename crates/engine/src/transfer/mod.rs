//! Copy-then-delete moves between (possibly different) backends.
//!
//! The inbox and the archive are separate roots, so a move is never a
//! rename: the bytes are read from the source, written to a destination that
//! must not exist yet, and only then is the source deleted. Every phase has
//! its own [`ErrorKind`] so callers can say exactly what state the files
//! were left in.

pub mod error;

use crate::transfer::error::{ErrorKind, Result};
use crate::validator::exists;
use exn::ResultExt;
use filer_storage::StorageBackend;
use filer_storage::error::ErrorKind as StorageErrorKind;
use std::fmt;
use std::ops::Deref;
use std::path::Path;

/// A path within a particular backend.
#[derive(Clone, Copy)]
pub struct Location<'a> {
    pub backend: &'a dyn StorageBackend,
    pub path: &'a Path,
}
impl<'a> Location<'a> {
    pub fn new(backend: &'a dyn StorageBackend, path: &'a Path) -> Self {
        Self { backend, path }
    }
}
impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.backend.name(), self.path.display())
    }
}

/// Move a file from `source` to `destination`.
///
/// # Errors
/// - [`SourcePathInvalid`](ErrorKind::SourcePathInvalid): the source does
///   not exist.
/// - [`DestinationPathAlreadyInUse`](ErrorKind::DestinationPathAlreadyInUse):
///   the destination exists, or appeared while we were copying.
/// - [`FailedToCopyFile`](ErrorKind::FailedToCopyFile): nothing was deleted
///   and the source is intact.
/// - [`FailedToDeleteFile`](ErrorKind::FailedToDeleteFile): the file exists at
///   both paths.
#[tracing::instrument(skip_all, fields(from = %source, to = %destination))]
pub async fn move_file(source: Location<'_>, destination: Location<'_>) -> Result<()> {
    if !exists(source.backend, source.path).await {
        exn::bail!(ErrorKind::SourcePathInvalid(source.path.to_path_buf()));
    }
    if exists(destination.backend, destination.path).await {
        exn::bail!(ErrorKind::DestinationPathAlreadyInUse(destination.path.to_path_buf()));
    }

    let data = match source.backend.read(source.path).await {
        Ok(data) => data,
        Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => {
            return Err(e).or_raise(|| ErrorKind::SourcePathInvalid(source.path.to_path_buf()));
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::FailedToCopyFile(destination.path.to_path_buf())),
    };
    match destination.backend.write(destination.path, &data).await {
        Ok(()) => {},
        Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => {
            return Err(e).or_raise(|| ErrorKind::DestinationPathAlreadyInUse(destination.path.to_path_buf()));
        },
        Err(e) => return Err(e).or_raise(|| ErrorKind::FailedToCopyFile(destination.path.to_path_buf())),
    }

    if let Err(e) = source.backend.delete(source.path).await {
        tracing::error!(error = ?e, "Copied file but could not delete the source; it now exists in both places");
        return Err(e).or_raise(|| ErrorKind::FailedToDeleteFile(source.path.to_path_buf()));
    }
    tracing::debug!(bytes = data.len(), "Moved file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filer_storage::backend::{LocalBackend, MockBackend, MockOperation};

    fn inbox() -> MockBackend {
        MockBackend::with_files([("invoice1.pdf", Vec::from(*b"%PDF-1.7"))]).with_name("inbox")
    }

    fn archive() -> MockBackend {
        MockBackend::default().with_dirs(["A/Acme/2024"]).with_name("archive")
    }

    #[tokio::test]
    async fn test_move_between_backends() {
        let (inbox, archive) = (inbox(), archive());
        let from = Path::new("invoice1.pdf");
        let to = Path::new("A/Acme/2024/invoice1.pdf");
        move_file(Location::new(&inbox, from), Location::new(&archive, to)).await.unwrap();
        assert!(!exists(&inbox, from).await);
        assert_eq!(archive.read(to).await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_round_trip_restores_original_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("inbox")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("archive/A/Acme/2024")).unwrap();
        std::fs::write(temp_dir.path().join("inbox/invoice1.pdf"), b"%PDF").unwrap();
        let inbox = LocalBackend::new("inbox", temp_dir.path().join("inbox")).unwrap();
        let archive = LocalBackend::new("archive", temp_dir.path().join("archive")).unwrap();
        let a = Location::new(&inbox, Path::new("invoice1.pdf"));
        let b = Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf"));

        move_file(a, b).await.unwrap();
        move_file(b, a).await.unwrap();
        assert!(exists(&inbox, a.path).await);
        assert!(!exists(&archive, b.path).await);
        assert_eq!(inbox.read(a.path).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_missing_source() {
        let (inbox, archive) = (inbox(), archive());
        let err = move_file(
            Location::new(&inbox, Path::new("missing.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/missing.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::SourcePathInvalid(_)));
    }

    #[tokio::test]
    async fn test_occupied_destination_is_untouched() {
        let inbox = inbox();
        let archive = MockBackend::with_files([("A/Acme/2024/invoice1.pdf", Vec::from(*b"original"))]);
        let err = move_file(
            Location::new(&inbox, Path::new("invoice1.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::DestinationPathAlreadyInUse(_)));
        assert_eq!(archive.read(Path::new("A/Acme/2024/invoice1.pdf")).await.unwrap(), b"original");
        assert!(exists(&inbox, Path::new("invoice1.pdf")).await);
    }

    #[tokio::test]
    async fn test_copy_failure_leaves_source_intact() {
        let inbox = inbox();
        let archive = archive().failing(MockOperation::Write);
        let err = move_file(
            Location::new(&inbox, Path::new("invoice1.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::FailedToCopyFile(_)));
        assert!(exists(&inbox, Path::new("invoice1.pdf")).await);
        assert!(!exists(&archive, Path::new("A/Acme/2024/invoice1.pdf")).await);
    }

    #[tokio::test]
    async fn test_unreadable_source_is_a_copy_failure() {
        let inbox = inbox().failing(MockOperation::Read);
        let archive = archive();
        let err = move_file(
            Location::new(&inbox, Path::new("invoice1.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::FailedToCopyFile(_)));
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_both_copies() {
        let inbox = inbox().failing(MockOperation::Delete);
        let archive = archive();
        let err = move_file(
            Location::new(&inbox, Path::new("invoice1.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::FailedToDeleteFile(_)));
        assert!(exists(&inbox, Path::new("invoice1.pdf")).await);
        assert!(exists(&archive, Path::new("A/Acme/2024/invoice1.pdf")).await);
    }

    #[tokio::test]
    async fn test_missing_destination_folder_is_a_copy_failure() {
        let (inbox, archive) = (inbox(), MockBackend::default());
        let err = move_file(
            Location::new(&inbox, Path::new("invoice1.pdf")),
            Location::new(&archive, Path::new("A/Acme/2024/invoice1.pdf")),
        )
        .await
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::FailedToCopyFile(_)));
        assert!(exists(&inbox, Path::new("invoice1.pdf")).await);
    }
}
