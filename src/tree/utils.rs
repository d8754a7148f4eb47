//! Shared helpers for filtering and walking

use std::cmp::Ordering;

use crate::source::Entry;

/// Characters that turn a pattern into a glob.
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '!'];

/// Whether a pattern should be treated as a glob rather than a substring.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_CHARS)
}

/// Extension of a file name, without the dot.
///
/// Dotfiles such as `.bashrc` and names ending in a dot have no extension.
pub fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// File name without its extension.
pub fn stem_of(name: &str) -> &str {
    match extension_of(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}

/// Case-insensitive name order, ties broken by the exact name.
pub fn compare_names(a: &Entry, b: &Entry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}
