//! Reversing a sort or a folder creation from the record it returned.
//!
//! Records are not tracked, so undoing the same record twice simply runs the
//! reversal again against whatever is on disk now: the second attempt
//! usually fails because the file or folder is already gone.

use crate::collision::resolve_name;
use crate::folder::bucket;
use crate::lock::LockKey;
use crate::namespace::{Namespace, run_detached};
use crate::outcome::{Cause, Outcome};
use crate::record::{FolderRecord, TransferRecord, UndoAction, UndoRequest};
use crate::sort::rename_note;
use crate::transfer::error::ErrorKind as MoveErrorKind;
use crate::transfer::{Location, move_file};
use crate::validator::exists;
use filer_storage::error::ErrorKind as StorageErrorKind;
use filer_storage::{validate_name, validate_path};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Result of an undo, with the caller's action id echoed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Undone {
    pub action_id: Value,
    pub outcome: Outcome<()>,
}

fn invalid(value: &str) -> Outcome<()> {
    Outcome::failure(Cause::InvalidInput, format!("Undo Failed - {value} is not a valid path."))
}

impl Namespace {
    /// Reverse the action described by `request`. Like every mutation, it
    /// runs to completion even if the returned future is dropped.
    #[tracing::instrument(skip_all, fields(namespace = %self.name, action_id = %request.action_id))]
    pub async fn undo(&self, request: UndoRequest) -> Undone {
        let namespace = self.clone();
        let action = request.action;
        let outcome = run_detached(
            async move {
                match &action {
                    UndoAction::Transfer(record) => namespace.undo_transfer(record).await,
                    UndoAction::CreateFolder(record) => namespace.undo_create_folder(record).await,
                }
            },
            "Undo Failed - The action could not be completed.",
        )
        .await;
        Undone {
            action_id: request.action_id,
            outcome,
        }
    }

    /// Remove a category folder again, provided it is still empty.
    async fn undo_create_folder(&self, record: &FolderRecord) -> Outcome<()> {
        let Some(letter) = bucket(&record.letter) else {
            return invalid(&record.letter);
        };
        let Ok(name) = validate_name(&record.category_name) else {
            return invalid(&record.category_name);
        };
        let path = PathBuf::from(letter).join(name);
        let _guard = self.locks.acquire([LockKey::Archive(path.clone())]).await;

        if !exists(&*self.directories, &path).await {
            return Outcome::failure(Cause::NotFound, format!("Undo Failed - Directory {name} does not exist."));
        }
        match self.directories.remove_dir(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed category folder");
                Outcome::success(format!("Undo Successful - Directory {name} was removed."), ())
            },
            Err(e) => {
                tracing::error!(error = ?e, "Could not remove category folder");
                match &*e {
                    StorageErrorKind::NotEmpty(_) => {
                        Outcome::failure(Cause::NotEmpty, format!("Undo Failed - Directory {name} is not empty."))
                    },
                    StorageErrorKind::NotFound(_) => {
                        Outcome::failure(Cause::NotFound, format!("Undo Failed - Directory {name} does not exist."))
                    },
                    _ => Outcome::failure(Cause::Storage, format!("Undo Failed - Directory {name} could not be removed.")),
                }
            },
        }
    }

    /// Move a filed invoice back into the inbox under the name it had there,
    /// or a fresh one if that name has been reused since.
    async fn undo_transfer(&self, record: &TransferRecord) -> Outcome<()> {
        let Ok(category) = validate_path(&record.category_path) else {
            return invalid(&record.category_path);
        };
        let (Ok(year), Ok(filed_name)) = (validate_name(&record.year), validate_name(&record.new_invoice_name)) else {
            return invalid(&format!("{}/{}/{}", record.category_path, record.year, record.new_invoice_name));
        };
        // The name it had in the inbox. Equal to the filed name unless sorting
        // had to rename it.
        let Ok(desired) = validate_name(&record.old_invoice_name) else {
            return invalid(&record.old_invoice_name);
        };
        let filed = category.join(year).join(filed_name);
        let _guard = self
            .locks
            .acquire([LockKey::Archive(category.clone()), LockKey::Inbox(PathBuf::from(desired))])
            .await;

        let restored_name = resolve_name(&*self.invoices, Path::new(""), desired).await;
        let note = rename_note(desired, &restored_name);
        let source = Location::new(&*self.directories, &filed);
        let destination = Location::new(&*self.invoices, Path::new(&restored_name));
        if let Err(e) = move_file(source, destination).await {
            tracing::error!(error = ?e, "Undo transfer failed");
            let category_name = &record.category_name;
            let (cause, message) = match &*e {
                MoveErrorKind::SourcePathInvalid(_) => (
                    Cause::NotFound,
                    format!("Undo Failed - {filed_name} is no longer in {category_name}."),
                ),
                MoveErrorKind::DestinationPathAlreadyInUse(_) => (
                    Cause::Conflict,
                    format!("Undo Failed - {restored_name} already exists in the invoice folder."),
                ),
                MoveErrorKind::FailedToCopyFile(_) => (
                    Cause::Storage,
                    format!("Undo Failed - {filed_name} could not be copied out of {category_name}."),
                ),
                MoveErrorKind::FailedToDeleteFile(_) => (
                    Cause::PartialTransfer,
                    format!("Undo Failed - {filed_name} was copied back but could not be removed from {category_name}."),
                ),
            };
            return Outcome::failure(cause, format!("{message}{note}"));
        }

        tracing::info!(restored = %restored_name, "Invoice returned to inbox");
        Outcome::success(
            format!(
                "Undo Successful - {filed_name} was moved from {} back to the invoice folder.{note}",
                record.category_name
            ),
            (),
        )
    }
}
