//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for the handful of filesystem operations the filing engine
//! needs, across the local filesystem and an in-memory test double.
//!

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockBackend, MockOperation};
use crate::error::Result;
use crate::models::Entry;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// All storage operations are asynchronous; every call is a suspension point
/// and other requests may interleave between any two of them. Nothing is
/// cached: each call observes the tree as it is right now.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use filer_storage::{backend::StorageBackend, error::Result};
///
/// async fn size_of_invoice(backend: &dyn StorageBackend, name: &str) -> Result<u64> {
///     let path = Path::new(name);
///     if backend.exists(path).await? {
///         let data = backend.read(path).await?;
///         Ok(data.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List the immediate children of a directory (`None` for the root).
    ///
    /// Default implementation collects [`entries()`](Self::entries) into a
    /// [`Vec`]. Order is unspecified; sort if it matters.
    async fn list(&self, dir: Option<&Path>) -> Result<Vec<Entry>> {
        self.entries(dir).try_collect().await
    }

    /// Stream the immediate children of a directory (`None` for the root).
    ///
    /// Listing a directory that doesn't exist yields nothing rather than an
    /// error, so a bucket deleted behind our back reads as empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::TryStreamExt;
    /// use std::path::Path;
    /// # use filer_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// let mut stream = backend.entries(Some(Path::new("A")));
    /// while let Some(entry) = stream.try_next().await? {
    ///     if entry.is_dir() {
    ///         println!("category: {}", entry.path.display());
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    fn entries<'a>(&'a self, dir: Option<&'a Path>) -> EntryStream<'a>;

    /// Check if a file or directory exists.
    ///
    /// Returns an error only when existence cannot be determined (invalid
    /// path, permission denied on a parent, ...).
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a **new** file.
    ///
    /// Never overwrites: if anything already exists at `path` this returns
    /// [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists). The parent
    /// directory must already exist. If writing fails part-way, the partial
    /// file is removed before the error is returned.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use filer_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// backend.write(Path::new("A/Acme/2024/invoice1.pdf"), b"%PDF-1.7").await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Create a single directory. The parent must exist.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if
    /// the path is already taken.
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory.
    ///
    /// Returns [`NotEmpty`](crate::error::ErrorKind::NotEmpty) if it still has
    /// children, [`NotFound`](crate::error::ErrorKind::NotFound) if missing.
    async fn remove_dir(&self, path: &Path) -> Result<()>;
}
