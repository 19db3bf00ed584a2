//! The filing engine: letter-bucketed archives, collision-free names, and
//! moves that can be undone.
//!
//! Each [`Namespace`] files invoices from a flat inbox into
//! `directories/<letter>/<category>/<year>/`. Every public operation returns
//! an [`Outcome`] with a human-readable message; errors never escape. The
//! building blocks ([`collision`], [`topology`], [`transfer`], [`year`]) are
//! public for reuse and testing.

pub mod collision;
pub mod error;
mod folder;
mod listing;
mod lock;
mod namespace;
mod outcome;
mod record;
mod registry;
mod sort;
pub mod topology;
pub mod transfer;
mod undo;
pub mod validator;
pub mod year;

pub use crate::folder::CreateFolderRequest;
pub use crate::listing::{Invoice, LetterBucket};
pub use crate::namespace::Namespace;
pub use crate::outcome::{Cause, Outcome};
pub use crate::record::{FolderRecord, TransferRecord, UndoAction, UndoRequest};
pub use crate::registry::Registry;
pub use crate::sort::SortRequest;
pub use crate::undo::Undone;
