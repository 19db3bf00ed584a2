//! In-memory storage backend for testing.

use super::EntryStream;
use crate::error::{ErrorKind, Result};
use crate::models::Entry;
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::StorageBackend;

/// Operations that a [`MockBackend`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Exists,
    Read,
    Write,
    Delete,
    CreateDir,
    RemoveDir,
}

#[derive(Default)]
struct Tree {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}
impl Tree {
    fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    /// The root always exists; anything else must be a known directory.
    fn parent_exists(&self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if parent != Path::new("") => self.dirs.contains(parent),
            _ => true,
        }
    }

    fn has_children(&self, dir: &Path) -> bool {
        self.files.keys().chain(self.dirs.iter()).any(|path| path.parent() == Some(dir))
    }
}

/// In-memory storage backend for testing.
///
/// Files and directories are stored behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Any
/// operation can be made to fail with
/// [`PermissionDenied`](ErrorKind::PermissionDenied) to exercise the
/// partial-failure paths the local filesystem rarely produces on demand.
///
/// # Examples
///
/// ```
/// use filer_storage::backend::{MockBackend, MockOperation, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([("invoice1.pdf", b"%PDF")]).failing(MockOperation::Delete);
/// assert!(backend.exists(Path::new("invoice1.pdf")).await?);
/// assert!(backend.delete(Path::new("invoice1.pdf")).await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    tree: RwLock<Tree>,
    failing: HashSet<MockOperation>,
    failing_at: HashSet<(MockOperation, PathBuf)>,
    delays: HashMap<MockOperation, Duration>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files. Parent directories are
    /// created implicitly.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut tree = Tree::default();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            tree.dirs.extend(validated.ancestors().skip(1).filter(|p| *p != Path::new("")).map(Path::to_path_buf));
            tree.files.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            tree: RwLock::new(tree),
            failing: HashSet::new(),
            failing_at: HashSet::new(),
            delays: HashMap::new(),
        }
    }

    /// Pre-create (possibly nested) directories.
    pub fn with_dirs(self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        {
            let mut tree = self.tree.try_write().unwrap_or_else(|_| panic!("MockBackend::with_dirs: tree is locked"));
            for dir in dirs {
                let dir = dir.into();
                let Ok(validated) = validate_path(&dir) else {
                    panic!("MockBackend::with_dirs: invalid path {}", dir.display());
                };
                tree.dirs.extend(validated.ancestors().filter(|p| *p != Path::new("")).map(Path::to_path_buf));
            }
        }
        self
    }

    /// Make every call of `operation` fail with a permission error.
    pub fn failing(mut self, operation: MockOperation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Make `operation` fail on one path only.
    pub fn failing_at(mut self, operation: MockOperation, path: impl Into<PathBuf>) -> Self {
        self.failing_at.insert((operation, path.into()));
        self
    }

    /// Sleep for `delay` at the start of every call of `operation`.
    pub fn delaying(mut self, operation: MockOperation, delay: Duration) -> Self {
        self.delays.insert(operation, delay);
        self
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    async fn check(&self, operation: MockOperation, path: &Path) -> Result<()> {
        if let Some(delay) = self.delays.get(&operation) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&operation) || self.failing_at.contains(&(operation, path.to_path_buf())) {
            exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries<'a>(&'a self, dir: Option<&'a Path>) -> EntryStream<'a> {
        let validated_dir = match dir.map(validate_path).transpose() {
            Ok(dir) => dir,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let entries: Vec<Entry> = {
                let guard = self.tree.read().await;
                let parent = validated_dir.clone().unwrap_or_default();
                let files = guard
                    .files
                    .iter()
                    .filter(|(path, _)| path.parent() == Some(parent.as_path()))
                    .map(|(path, data)| Entry::file(path.clone(), data.len() as u64));
                let dirs = guard
                    .dirs
                    .iter()
                    .filter(|path| path.parent() == Some(parent.as_path()))
                    .map(|path| Entry::directory(path.clone()));
                files.chain(dirs).collect()
            };
            for entry in entries {
                yield Ok(entry);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        self.check(MockOperation::Exists, &path).await?;
        Ok(self.tree.read().await.contains(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.check(MockOperation::Read, &path).await?;
        self.tree.read().await.files.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.check(MockOperation::Write, &path).await?;
        let mut guard = self.tree.write().await;
        if guard.contains(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        if !guard.parent_exists(&path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        guard.files.insert(path, data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(MockOperation::Delete, &path).await?;
        self.tree.write().await.files.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(MockOperation::CreateDir, &path).await?;
        let mut guard = self.tree.write().await;
        if guard.contains(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        if !guard.parent_exists(&path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        guard.dirs.insert(path);
        Ok(())
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.check(MockOperation::RemoveDir, &path).await?;
        let mut guard = self.tree.write().await;
        if !guard.dirs.contains(&path) {
            exn::bail!(ErrorKind::NotFound(path));
        }
        if guard.has_children(&path) {
            exn::bail!(ErrorKind::NotEmpty(path));
        }
        guard.dirs.remove(&path);
        Ok(())
    }
}
