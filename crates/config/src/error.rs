use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// Only `.toml`, `.yaml`/`.yml` and `.json` files are understood.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    #[display("failed to load configuration: {_0}")]
    Load(#[error(not(source))] String),
    #[display("no namespaces configured")]
    NoNamespaces,
    #[display("invalid namespace name: {_0:?}")]
    InvalidNamespace(#[error(not(source))] String),
    #[display("namespace `{namespace}`: {} is not an absolute path", path.display())]
    RelativeRoot {
        namespace: String,
        #[error(not(source))]
        path: PathBuf,
    },
    #[display("roots {} and {} overlap", first.display(), second.display())]
    OverlappingRoots {
        #[error(not(source))]
        first: PathBuf,
        #[error(not(source))]
        second: PathBuf,
    },
}

impl ErrorKind {
    /// Configuration problems never fix themselves.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
