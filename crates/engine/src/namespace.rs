use crate::error::{ErrorKind, Result};
use crate::lock::PathLocks;
use crate::outcome::{Cause, Outcome};
use crate::topology::ensure_letter_buckets;
use exn::ResultExt;
use filer_config::NamespaceConfig;
use filer_storage::BackendHandle;
use filer_storage::backend::LocalBackend;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// One filing engine: an inbox, an archive and the locks guarding them.
///
/// Holds no other state; every operation reads the trees afresh. Cloning is
/// cheap and the clone shares backends and locks with the original.
#[derive(Clone)]
pub struct Namespace {
    pub(crate) name: String,
    pub(crate) invoices: BackendHandle,
    pub(crate) directories: BackendHandle,
    pub(crate) locks: PathLocks,
}

impl Namespace {
    /// Wrap two already-open backends. Does not touch either tree; call
    /// [`prepare`](Self::prepare) before serving requests.
    pub fn new(name: impl Into<String>, invoices: BackendHandle, directories: BackendHandle) -> Self {
        Self {
            name: name.into(),
            invoices,
            directories,
            locks: PathLocks::new(),
        }
    }

    /// Open a namespace on the local filesystem and make it ready.
    ///
    /// # Errors
    /// - [`ErrorKind::Roots`] if either root is missing, or they are the same
    ///   directory, or one contains the other.
    /// - [`ErrorKind::Topology`] if the letter buckets cannot be created.
    #[tracing::instrument(skip_all, fields(namespace = %name))]
    pub async fn open(name: &str, invoice_root: &Path, directories_root: &Path) -> Result<Self> {
        check_roots(invoice_root, directories_root)?;
        let invoices = LocalBackend::new(format!("{name}:invoices"), invoice_root)
            .or_raise(|| ErrorKind::Roots(format!("cannot open invoice root {}", invoice_root.display())))?;
        let directories = LocalBackend::new(format!("{name}:directories"), directories_root)
            .or_raise(|| ErrorKind::Roots(format!("cannot open directories root {}", directories_root.display())))?;
        let namespace = Self::new(name, Arc::new(invoices), Arc::new(directories));
        namespace.prepare().await?;
        tracing::info!(
            invoice_root = %invoice_root.display(),
            directories_root = %directories_root.display(),
            "Namespace ready"
        );
        Ok(namespace)
    }

    pub async fn from_config(name: &str, config: &NamespaceConfig) -> Result<Self> {
        Self::open(name, &config.invoice_root, &config.directories_root).await
    }

    /// Bring the archive topology up to date. Must succeed before the
    /// namespace accepts requests.
    pub async fn prepare(&self) -> Result<()> {
        ensure_letter_buckets(self.directories.as_ref()).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Run a mutation on its own task and wait for it.
///
/// A move that has copied a file must also get to delete it, so the work
/// carries on even if whoever asked for it stops waiting. A panic inside the
/// task is reported as [`Cause::Unknown`] with `failure` as the message.
pub(crate) async fn run_detached<T, F>(operation: F, failure: &str) -> Outcome<T>
where
    F: Future<Output = Outcome<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(operation.in_current_span()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "Operation did not run to completion");
            Outcome::failure(Cause::Unknown, failure)
        },
    }
}

/// Both roots must exist and be disjoint: the same directory, or one nested
/// inside the other, would let filing and listing see each other's files.
fn check_roots(invoice_root: &Path, directories_root: &Path) -> Result<()> {
    // Non-async: only happens once per namespace at startup.
    let canonical = |root: &Path| {
        std::fs::canonicalize(root).or_raise(|| ErrorKind::Roots(format!("{} is not accessible", root.display())))
    };
    let invoices = canonical(invoice_root)?;
    let directories = canonical(directories_root)?;
    if invoices == directories {
        exn::bail!(ErrorKind::Roots(format!("both roots are {}", invoices.display())));
    }
    if invoices.starts_with(&directories) || directories.starts_with(&invoices) {
        exn::bail!(ErrorKind::Roots(format!(
            "{} and {} overlap",
            invoices.display(),
            directories.display()
        )));
    }
    Ok(())
}
