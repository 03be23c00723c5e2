//! Resolve a user-supplied reference (ID or name) to a thread file.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ident::{self, extract_id_from_path, extract_name_from_path, slugify};
use crate::workspace::find_all_threads;

/// Find a thread under `root` by ID or name.
pub fn find_by_ref(root: &Path, reference: &str) -> Result<PathBuf> {
    let threads = find_all_threads(root);
    resolve_ref(&threads, reference)
}

/// Pick the thread `reference` names out of `threads`.
///
/// Exact ID wins, then an exact name (the filename slug, compared against the
/// reference as typed and slugified), then a unique case-insensitive substring
/// of the name. Several substring hits are ambiguous.
pub fn resolve_ref(threads: &[PathBuf], reference: &str) -> Result<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Error::NotFound(reference.to_string()));
    }

    if ident::is_id(reference)
        && let Some(hit) = threads
            .iter()
            .find(|t| extract_id_from_path(t).as_deref() == Some(reference))
    {
        return Ok(hit.clone());
    }

    let lower = reference.to_lowercase();
    let slug = slugify(reference);
    let mut matches = Vec::new();

    for t in threads {
        let name = extract_name_from_path(t);
        if name == reference || (!slug.is_empty() && name == slug) {
            return Ok(t.clone());
        }
        let name_lower = name.to_lowercase();
        if name_lower.contains(&lower) || (!slug.is_empty() && name_lower.contains(&slug)) {
            matches.push(t);
        }
    }

    match matches.as_slice() {
        [] => Err(Error::NotFound(reference.to_string())),
        [only] => Ok((*only).clone()),
        many => Err(Error::Ambiguous {
            reference: reference.to_string(),
            candidates: many.iter().map(|p| describe(p)).collect(),
        }),
    }
}

/// `id (name)` label used in ambiguity messages.
pub fn describe(path: &Path) -> String {
    let id = extract_id_from_path(path).unwrap_or_else(|| "??????".to_string());
    format!("{} ({})", id, extract_name_from_path(path))
}
