//! Storage backends for a single rooted directory tree.
//!
//! Every path handed to a backend is relative to that backend's root and is
//! run through [`validate_path`] first, so nothing can escape the root. The
//! engine opens one backend for the invoice inbox and another for the
//! bucketed archive; moving a file between them is a copy followed by a
//! delete, never a rename.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::{Entry, EntryKind};
pub use crate::path::{validate as validate_path, validate_name};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
