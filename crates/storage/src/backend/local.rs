//! Local filesystem storage backend.
//!
//! This module provides a storage backend implementation for the local filesystem.
//! Files are stored in a configured directory and accessed using standard filesystem
//! operations via `tokio::fs` for async I/O.

use crate::backend::EntryStream;
use crate::error::ErrorKind;
use crate::{Entry, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Local filesystem storage backend.
///
/// Operates on an existing directory on the local filesystem. All paths are
/// relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use filer_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("inbox", "/srv/invoices/inbox")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the tree
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `root` - Absolute path to an existing directory
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or not a directory, and [`NotFound`](ErrorKind::NotFound) if
    /// it doesn't exist. Roots are never created on the caller's behalf.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Use non-async here; it'll only happen once on namespace startup
        // and it's not worth the hassle of making the constructor async.
        let metadata = std::fs::metadata(&root).map_err(|e| Self::map_io_error(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }

        Ok(Self { name: name.into(), root })
    }

    /// Absolute root directory this backend operates on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            std::io::ErrorKind::DirectoryNotEmpty => ErrorKind::NotEmpty(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Pulled out of the stream loop so that `?` can be used.
    async fn process_entry(&self, entry: DirEntry) -> Result<Option<Entry>> {
        let path = entry.path();
        // Follows symlinks, so a linked category folder lists like any other.
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Skipping broken symlink");
                return Ok(None);
            },
            Err(e) => exn::bail!(Self::map_io_error(e, &path)),
        };
        let relative = self.relative_path(&path)?;
        if metadata.is_dir() {
            return Ok(Some(Entry::directory(relative)));
        }
        if metadata.is_file() {
            return Ok(Some(Entry::file(relative, metadata.len())));
        }
        // Sockets, FIFOs and devices.
        Ok(None)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries<'a>(&'a self, dir: Option<&'a Path>) -> EntryStream<'a> {
        let start = match dir.map(|dir| self.absolute_path(dir)).transpose() {
            Ok(start) => start.unwrap_or_else(|| self.root.clone()),
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };

        Box::pin(stream! {
            let mut entries = match fs::read_dir(&start).await {
                Ok(entries) => entries,
                // A directory that doesn't exist has no children.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &start)));
                    return;
                }
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(exn::Exn::from(Self::map_io_error(e, &start)));
                        break;
                    },
                };
                match self.process_entry(entry).await {
                    Ok(Some(entry)) => yield Ok(entry),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs_path)
            .await
            .map_err(|e| Self::map_io_error(e, path))?;
        let written: std::io::Result<()> = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            // We created this file, so it's ours to clean up. Don't let a
            // failed cleanup mask the original error.
            if let Err(cleanup) = fs::remove_file(&abs_path).await {
                tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partially written file");
            }
            exn::bail!(Self::map_io_error(e, path));
        }
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::create_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}
