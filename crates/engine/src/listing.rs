//! Read-only views: the category folders per bucket, and the next invoice
//! waiting in the inbox. Neither takes locks, so either may observe a folder
//! or file mid-creation.

use crate::namespace::Namespace;
use crate::outcome::{Cause, Outcome};
use crate::topology::LETTERS;
use base64::{Engine as _, engine::general_purpose};
use filer_storage::Entry;
use serde::Serialize;
use std::path::Path;

pub(crate) const NO_VALID_FILES: &str = "No valid files found.";

/// Category folders filed under one letter, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterBucket {
    pub letter: char,
    pub categories: Vec<String>,
}

/// The next pending invoice, with its contents base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub file_name: String,
    pub data: String,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl Namespace {
    /// Every letter bucket, A to Z, with its category folders.
    ///
    /// A bucket removed from under us lists as empty.
    #[tracing::instrument(skip_all, fields(namespace = %self.name))]
    pub async fn list_directories(&self) -> Outcome<Vec<LetterBucket>> {
        let mut buckets = Vec::with_capacity(LETTERS.len());
        for letter in LETTERS {
            let entries = match self.directories.list(Some(Path::new(&letter.to_string()))).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(error = ?e, %letter, "Could not list letter bucket");
                    return Outcome::failure(Cause::Storage, "Could not read the directories folder.");
                },
            };
            let mut categories: Vec<String> =
                entries.iter().filter(|entry| entry.is_dir()).filter_map(Entry::name).map(str::to_string).collect();
            categories.sort();
            buckets.push(LetterBucket { letter, categories });
        }
        Outcome::success("Directories listed.", buckets)
    }

    /// The first readable regular file in the inbox, by name.
    ///
    /// Hidden files are skipped. A file that cannot be read (still being
    /// scanned in, permissions) is skipped in favour of the next one.
    #[tracing::instrument(skip_all, fields(namespace = %self.name))]
    pub async fn next_invoice(&self) -> Outcome<Invoice> {
        let entries = match self.invoices.list(None).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = ?e, "Could not list invoice folder");
                return Outcome::failure(Cause::Storage, "Could not read the invoice folder.");
            },
        };
        let mut candidates: Vec<&str> = entries
            .iter()
            .filter(|entry| entry.is_file())
            .filter_map(Entry::name)
            .filter(|name| !is_hidden(name))
            .collect();
        candidates.sort_unstable();

        for name in candidates {
            match self.invoices.read(Path::new(name)).await {
                Ok(data) => {
                    return Outcome::success(
                        format!("Next invoice is {name}."),
                        Invoice {
                            file_name: name.to_string(),
                            data: general_purpose::STANDARD.encode(data),
                        },
                    );
                },
                Err(e) => tracing::warn!(error = ?e, file = name, "Skipping unreadable invoice"),
            }
        }
        Outcome::failure(Cause::NotFound, NO_VALID_FILES)
    }
}
