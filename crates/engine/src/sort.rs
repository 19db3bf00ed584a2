//! Filing one invoice from the inbox into a category's year folder.

use crate::collision::resolve_name;
use crate::error::ErrorKind;
use crate::lock::LockKey;
use crate::namespace::{Namespace, run_detached};
use crate::outcome::{Cause, Outcome};
use crate::record::TransferRecord;
use crate::transfer::error::ErrorKind as MoveErrorKind;
use crate::transfer::{Location, move_file};
use crate::validator::exists;
use crate::year::ensure_year_folder;
use filer_storage::{validate_name, validate_path};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortRequest {
    /// Category folder relative to the archive root (`A/Acme`).
    pub category_path: String,
    /// Display name of the category, used in messages and the undo record.
    pub category_name: String,
    /// File name in the inbox.
    pub invoice_name: String,
    pub year: String,
}

fn invalid_path(path: &str) -> String {
    format!("Transfer Failed - {path} is not a valid path.")
}

fn generic_failure(request: &SortRequest) -> String {
    format!("Transfer Failed - {} failed to transfer to {}.", request.invoice_name, request.category_name)
}

pub(crate) fn rename_note(original: &str, renamed: &str) -> String {
    match original == renamed {
        true => String::new(),
        false => format!(" {original} was renamed to {renamed} to avoid a name collision."),
    }
}

impl Namespace {
    /// File `invoice_name` from the inbox into `category_path/year`.
    ///
    /// The year folder is created if needed and the invoice is renamed if its
    /// name is already taken there. On success the payload is the record that
    /// reverses the move.
    ///
    /// Once started, the sort runs to completion even if the returned future
    /// is dropped.
    #[tracing::instrument(skip_all, fields(namespace = %self.name, invoice = %request.invoice_name, category = %request.category_path, year = %request.year))]
    pub async fn sort(&self, request: SortRequest) -> Outcome<TransferRecord> {
        let failure = generic_failure(&request);
        let namespace = self.clone();
        run_detached(async move { namespace.file_invoice(request).await }, &failure).await
    }

    async fn file_invoice(&self, request: SortRequest) -> Outcome<TransferRecord> {
        let Ok(category) = validate_path(&request.category_path) else {
            return Outcome::failure(Cause::InvalidInput, invalid_path(&request.category_path));
        };
        let Ok(invoice) = validate_name(&request.invoice_name) else {
            return Outcome::failure(Cause::InvalidInput, invalid_path(&request.invoice_name));
        };
        let _guard = self
            .locks
            .acquire([LockKey::Archive(category.clone()), LockKey::Inbox(PathBuf::from(invoice))])
            .await;
        if !exists(&*self.directories, &category).await {
            return Outcome::failure(Cause::NotFound, invalid_path(&request.category_path));
        }
        if !exists(&*self.invoices, Path::new(invoice)).await {
            return Outcome::failure(Cause::NotFound, invalid_path(&request.invoice_name));
        }

        let folder = match ensure_year_folder(&*self.directories, &category, &request.year).await {
            Ok(folder) => folder,
            Err(e) => {
                tracing::error!(error = ?e, "Could not prepare year folder");
                let (cause, reason) = match &*e {
                    ErrorKind::InvalidName(_) => (Cause::InvalidInput, format!("{} is not a valid year.", request.year)),
                    _ => (Cause::Storage, format!("Year folder {} could not be created.", request.year)),
                };
                return Outcome::failure(cause, format!("{} {reason}", generic_failure(&request)));
            },
        };

        let filed_name = resolve_name(&*self.directories, &folder, invoice).await;
        let note = rename_note(invoice, &filed_name);

        let source = Location::new(&*self.invoices, Path::new(invoice));
        let filed = folder.join(&filed_name);
        let destination = Location::new(&*self.directories, &filed);
        if let Err(e) = move_file(source, destination).await {
            tracing::error!(error = ?e, "Transfer failed");
            let (cause, message) = match &*e {
                MoveErrorKind::SourcePathInvalid(_) => (
                    Cause::NotFound,
                    format!("Transfer Failed - {invoice} is no longer in the invoice folder."),
                ),
                MoveErrorKind::DestinationPathAlreadyInUse(_) => (
                    Cause::Conflict,
                    format!("Transfer Failed - {filed_name} already exists in {}.", request.category_name),
                ),
                MoveErrorKind::FailedToCopyFile(_) => (
                    Cause::Storage,
                    format!("Transfer Failed - {invoice} could not be copied to {}.", request.category_name),
                ),
                MoveErrorKind::FailedToDeleteFile(_) => (
                    Cause::PartialTransfer,
                    format!(
                        "Transfer Failed - {invoice} was copied to {} but could not be removed from the invoice folder.",
                        request.category_name
                    ),
                ),
            };
            return Outcome::failure(cause, format!("{message}{note}"));
        }

        tracing::info!(filed = %filed.display(), "Invoice filed");
        let message = format!(
            "Transfer Successful - {invoice} was filed in {}/{}.{note}",
            request.category_name, request.year
        );
        Outcome::success(
            message,
            TransferRecord {
                old_invoice_name: invoice.to_string(),
                new_invoice_name: filed_name,
                category_path: category.to_string_lossy().into_owned(),
                category_name: request.category_name,
                year: request.year,
            },
        )
    }
}
