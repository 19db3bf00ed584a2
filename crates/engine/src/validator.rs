use filer_storage::StorageBackend;
use std::path::Path;

/// Whether `path` currently exists in `backend`.
///
/// Never fails: a path that cannot be checked (permission denied, invalid,
/// backend error) is reported as absent. Nothing is cached because the tree
/// is changed by people as well as by us.
pub async fn exists(backend: &dyn StorageBackend, path: &Path) -> bool {
    match backend.exists(path).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::debug!(backend = backend.name(), path = %path.display(), error = %e, "Path not accessible");
            false
        },
    }
}
