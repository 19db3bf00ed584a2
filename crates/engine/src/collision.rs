//! Numbered-suffix collision resolution.
//!
//! `invoice1.pdf` becomes `invoice1 (2).pdf`, then `invoice1 (3).pdf`, and so
//! on. Names that carry no counter yet always get a `.pdf` extension on the
//! synthesized name, whatever their own extension was; the inbox only ever
//! holds scanned PDFs, and existing archives already contain names built that
//! way.

use crate::validator::exists;
use filer_storage::StorageBackend;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// A parenthesized counter directly before the final extension, or at the very end.
regex!(COUNTER_REGEX, r"^(?<stem>.*)\((?<counter>\d+)\)(?<ext>\.[^.()]*)?$");

const SYNTHESIZED_EXTENSION: &str = ".pdf";

/// Everything before the final `.`, ignoring a leading dot (`.hidden` has no
/// extension).
fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}

/// The name to try after `name` turned out to be taken.
pub fn next_candidate(name: &str) -> String {
    if let Some(captures) = COUNTER_REGEX.captures(name)
        && let Some(next) = captures["counter"].parse::<u64>().ok().and_then(|n| n.checked_add(1))
    {
        let ext = captures.name("ext").map_or("", |ext| ext.as_str());
        return format!("{}({next}){ext}", &captures["stem"]);
    }
    format!("{} (2){SYNTHESIZED_EXTENSION}", stem(name))
}

/// A name for `desired` that is free inside `folder` at the moment of the
/// last check.
///
/// Returns `desired` unchanged when nothing occupies it. Holds no lock: the
/// caller must serialize against other writers to the same folder, and the
/// create-new write that follows catches anything that slips through.
pub async fn resolve_name(backend: &dyn StorageBackend, folder: &Path, desired: &str) -> String {
    let mut candidate = desired.to_string();
    while exists(backend, &folder.join(&candidate)).await {
        let next = next_candidate(&candidate);
        tracing::debug!(folder = %folder.display(), taken = %candidate, next = %next, "Name collision");
        candidate = next;
    }
    candidate
}
