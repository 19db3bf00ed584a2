//! The 26 letter buckets at the top of every archive.

use crate::error::{ErrorKind, Result};
use crate::validator::exists;
use exn::ResultExt;
use filer_storage::StorageBackend;
use filer_storage::error::ErrorKind as StorageErrorKind;
use std::ops::Deref;
use std::path::Path;

/// Bucket names, in the order they are checked and created.
pub const LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V',
    'W', 'X', 'Y', 'Z',
];

/// Each round creates at most one bucket, so a healthy run needs at most 26
/// rounds plus the final check. The slack absorbs buckets that are removed
/// from under us while we work.
const MAX_ROUNDS: usize = LETTERS.len() * 2;

/// First bucket (alphabetically) that does not currently exist.
async fn first_missing(backend: &dyn StorageBackend) -> Option<char> {
    for letter in LETTERS {
        if !exists(backend, Path::new(&letter.to_string())).await {
            return Some(letter);
        }
    }
    None
}

/// Make sure every letter bucket exists under the backend root.
///
/// Each round re-checks the full set from scratch and creates only the first
/// missing bucket, so buckets created or removed concurrently by someone else
/// never leave us out of sync. A bucket that appears between the check and
/// our create is not an error. Running this against a complete set touches
/// nothing.
///
/// # Errors
/// Returns [`ErrorKind::Topology`] if a bucket cannot be created, or if the
/// set is still incomplete after a bounded number of rounds.
#[tracing::instrument(skip_all, fields(backend = backend.name()))]
pub async fn ensure_letter_buckets(backend: &dyn StorageBackend) -> Result<()> {
    for _ in 0..MAX_ROUNDS {
        let Some(letter) = first_missing(backend).await else {
            tracing::debug!("All letter buckets present");
            return Ok(());
        };
        let bucket = letter.to_string();
        match backend.create_dir(Path::new(&bucket)).await {
            Ok(()) => tracing::info!(bucket = %bucket, "Created letter bucket"),
            Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => {
                tracing::debug!(bucket = %bucket, "Letter bucket created concurrently");
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Topology),
        }
    }
    if first_missing(backend).await.is_none() {
        return Ok(());
    }
    exn::bail!(ErrorKind::Topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filer_storage::backend::{LocalBackend, MockBackend, MockOperation};

    #[tokio::test]
    async fn test_creates_all_buckets() {
        let backend = MockBackend::default();
        ensure_letter_buckets(&backend).await.unwrap();
        for letter in LETTERS {
            assert!(exists(&backend, Path::new(&letter.to_string())).await, "missing {letter}");
        }
        assert_eq!(backend.list(None).await.unwrap().len(), 26);
    }

    #[tokio::test]
    async fn test_fills_gaps_only() {
        let backend = MockBackend::with_files([("C/Cobalt/invoice.pdf", Vec::from(*b"1"))]).with_dirs(["A", "Q"]);
        ensure_letter_buckets(&backend).await.unwrap();
        assert_eq!(backend.list(None).await.unwrap().len(), 26);
        assert!(exists(&backend, Path::new("C/Cobalt/invoice.pdf")).await);
    }

    #[tokio::test]
    async fn test_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("archive", temp_dir.path()).unwrap();
        ensure_letter_buckets(&backend).await.unwrap();
        let mut before = backend.list(None).await.unwrap();
        before.sort_by(|a, b| a.path.cmp(&b.path));
        ensure_letter_buckets(&backend).await.unwrap();
        let mut after = backend.list(None).await.unwrap();
        after.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(before, after);
        assert_eq!(after.len(), 26);
    }

    #[tokio::test]
    async fn test_complete_set_needs_no_creation() {
        let letters: Vec<String> = LETTERS.iter().map(char::to_string).collect();
        // Creation would fail, so success proves nothing was created.
        let backend = MockBackend::default().with_dirs(letters).failing(MockOperation::CreateDir);
        ensure_letter_buckets(&backend).await.unwrap();
    }

    #[tokio::test]
    async fn test_creation_failure_is_fatal() {
        let backend = MockBackend::default().failing(MockOperation::CreateDir);
        let err = ensure_letter_buckets(&backend).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Topology));
    }
}
