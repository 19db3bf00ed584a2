use crate::lock::LockKey;
use crate::namespace::{Namespace, run_detached};
use crate::outcome::{Cause, Outcome};
use crate::record::FolderRecord;
use crate::validator::exists;
use filer_storage::error::ErrorKind as StorageErrorKind;
use filer_storage::validate_name;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(crate) const ALREADY_EXISTS: &str = "Directory already exists.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub category_name: String,
    pub letter: String,
}

/// The bucket a letter names, upper-cased. `None` unless it is exactly one
/// ASCII letter.
pub(crate) fn bucket(letter: &str) -> Option<String> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase().to_string()),
        _ => None,
    }
}

impl Namespace {
    /// Create the category folder `letter/category_name` in the archive.
    ///
    /// The letter is not checked against the category name; callers file
    /// "The Widget Co" under W or T as they see fit.
    #[tracing::instrument(skip_all, fields(namespace = %self.name, category = %request.category_name, letter = %request.letter))]
    pub async fn create_folder(&self, request: CreateFolderRequest) -> Outcome<FolderRecord> {
        let failure = format!("Create Folder Failed - {} could not be created.", request.category_name);
        let namespace = self.clone();
        run_detached(async move { namespace.make_folder(request).await }, &failure).await
    }

    async fn make_folder(&self, request: CreateFolderRequest) -> Outcome<FolderRecord> {
        let Some(letter) = bucket(&request.letter) else {
            return Outcome::failure(
                Cause::InvalidInput,
                format!("Create Folder Failed - {} is not a valid letter.", request.letter),
            );
        };
        let Ok(name) = validate_name(&request.category_name) else {
            return Outcome::failure(
                Cause::InvalidInput,
                format!("Create Folder Failed - {} is not a valid folder name.", request.category_name),
            );
        };
        let path = PathBuf::from(&letter).join(name);
        let _guard = self.locks.acquire([LockKey::Archive(path.clone())]).await;

        if exists(&*self.directories, &path).await {
            return Outcome::failure(Cause::Conflict, ALREADY_EXISTS);
        }
        match self.directories.create_dir(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Created category folder");
                Outcome::success(
                    format!("Directory {name} created under {letter}."),
                    FolderRecord {
                        category_name: name.to_string(),
                        letter,
                    },
                )
            },
            Err(e) if matches!(&*e, StorageErrorKind::AlreadyExists(_)) => {
                Outcome::failure(Cause::Conflict, ALREADY_EXISTS)
            },
            Err(e) => {
                tracing::error!(error = ?e, "Could not create category folder");
                Outcome::failure(Cause::Storage, format!("Create Folder Failed - {name} could not be created."))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::namespace;
    use filer_storage::StorageBackend;
    use rstest::rstest;
    use std::path::Path;

    fn request(category_name: &str, letter: &str) -> CreateFolderRequest {
        CreateFolderRequest {
            category_name: category_name.to_string(),
            letter: letter.to_string(),
        }
    }

    #[rstest]
    #[case("B", Some("B"))]
    #[case("b", Some("B"))]
    #[case("", None)]
    #[case("BB", None)]
    #[case("1", None)]
    #[case("É", None)]
    fn test_bucket(#[case] letter: &str, #[case] expected: Option<&str>) {
        assert_eq!(bucket(letter).as_deref(), expected);
    }

    #[tokio::test]
    async fn test_create_folder() {
        let namespace = namespace([], []).await;
        let outcome = namespace.create_folder(request("Beta", "b")).await;
        assert!(outcome.is_success(), "{}", outcome.message());
        assert_eq!(
            outcome.payload(),
            Some(&FolderRecord {
                category_name: "Beta".to_string(),
                letter: "B".to_string(),
            })
        );
        assert!(exists(&*namespace.directories, Path::new("B/Beta")).await);
    }

    #[tokio::test]
    async fn test_existing_folder_is_a_conflict() {
        let namespace = namespace([], ["B/Beta"]).await;
        namespace.directories.write(Path::new("B/Beta/keep.pdf"), b"1").await.unwrap();
        let outcome = namespace.create_folder(request("Beta", "B")).await;
        assert_eq!(outcome.cause(), Some(Cause::Conflict));
        assert_eq!(outcome.message(), "Directory already exists.");
        assert_eq!(namespace.directories.list(Some(Path::new("B/Beta"))).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let namespace = namespace([], []).await;
        for (name, letter) in [("Beta", "BB"), ("Beta", "?"), ("../Beta", "B"), ("Be/ta", "B"), ("", "B")] {
            let outcome = namespace.create_folder(request(name, letter)).await;
            assert_eq!(outcome.cause(), Some(Cause::InvalidInput), "{name:?} {letter:?}");
        }
    }

    #[tokio::test]
    async fn test_creation_failure() {
        use filer_storage::backend::{MockBackend, MockOperation};
        use std::sync::Arc;

        let letters: Vec<String> = crate::topology::LETTERS.iter().map(char::to_string).collect();
        let directories = MockBackend::default().with_dirs(letters).failing(MockOperation::CreateDir);
        let namespace = Namespace::new("test", Arc::new(MockBackend::default()), Arc::new(directories));
        let outcome = namespace.create_folder(request("Beta", "B")).await;
        assert_eq!(outcome.cause(), Some(Cause::Storage));
        assert_eq!(outcome.message(), "Create Folder Failed - Beta could not be created.");
    }
}
