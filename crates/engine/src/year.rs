use crate::error::{ErrorKind, Result};
use crate::validator::exists;
use exn::ResultExt;
use filer_storage::error::ErrorKind as StorageErrorKind;
use filer_storage::{StorageBackend, validate_name};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Make sure `category/year` exists and return its path.
///
/// Year folders are created on first use and never removed. Losing a race
/// with another creator is fine.
///
/// # Errors
/// - [`ErrorKind::InvalidName`] if `year` is not a single path segment.
/// - [`ErrorKind::YearFolder`] if the folder cannot be created (for example
///   because the category has vanished).
pub async fn ensure_year_folder(backend: &dyn StorageBackend, category: &Path, year: &str) -> Result<PathBuf> {
    let year = validate_name(year).or_raise(|| ErrorKind::InvalidName(year.to_string()))?;
    let folder = category.join(year);
    if exists(backend, &folder).await {
        return Ok(folder);
    }
    match backend.create_dir(&folder).await {
        Ok(()) => {
            tracing::info!(folder = %folder.display(), "Created year folder");
            Ok(folder)
        },
        Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => Ok(folder),
        Err(e) => Err(e).or_raise(|| ErrorKind::YearFolder(folder)),
    }
}
