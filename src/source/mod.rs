//! Source adapters: where entries and file bytes come from
//!
//! The walker only ever talks to a [`SourceAdapter`]. Two implementations exist:
//!
//! - `FileSystemSource`: local directories and files
//! - `GitHubSource`: a GitHub repository tree, read through the REST API
//!
//! Paths crossing this boundary are plain `/`-separated strings so that the
//! filtering and printing logic never branches on where an entry came from.

mod filesystem;
mod github;
mod http;

pub use filesystem::FileSystemSource;
pub use github::{GitHubOptions, GitHubSource, RepoLocator, is_github_locator};
pub use http::{HttpClient, HttpResponse, ReqwestClient, RetryPolicy};

use crate::error::Result;

/// What kind of node an [`Entry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
    /// Symlinks, sockets, submodules and anything else the walker skips.
    Other,
}

/// One node returned by [`SourceAdapter::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Source path in `/` form, as understood by the adapter that produced it.
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(path: impl Into<String>, name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// A root specifier after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRoot {
    Directory(String),
    /// The specifier names a single file: print it no matter what the filters say.
    File(String),
}

impl ResolvedRoot {
    pub fn path(&self) -> &str {
        match self {
            ResolvedRoot::Directory(p) | ResolvedRoot::File(p) => p,
        }
    }
}

/// Uniform listing/reading contract implemented by every source.
///
/// Adapters must not recurse on their own; the walker drives traversal one
/// directory at a time. `Send + Sync` is required because file contents of a
/// directory may be fetched on a worker pool.
pub trait SourceAdapter: Send + Sync {
    /// Short identifier of the source, e.g. `file` or `github.com/owner/repo@main`.
    fn origin(&self) -> String;

    /// Resolve a user-supplied specifier to a root path.
    fn resolve_root(&self, spec: &str) -> Result<ResolvedRoot>;

    /// List the immediate children of `dir`.
    ///
    /// Returns `PrinError::NotADirectory` when `dir` turns out to be a file.
    fn list_dir(&self, dir: &str) -> Result<Vec<Entry>>;

    fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Whether [`SourceAdapter::is_empty`] may be called.
    fn supports_empty_check(&self) -> bool;

    fn is_empty(&self, path: &str) -> Result<bool>;

    /// Drop anything kept from [`SourceAdapter::is_empty`] for a file that
    /// will not be read.
    fn release(&self, _path: &str) {}
}

/// Last `/`-separated segment of a path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Join a directory and a child name with a single `/`.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Express `path` relative to `root`, both in `/` form.
///
/// Returns `None` when `path` does not live under `root`.
pub fn relative_to<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path.trim_start_matches('/'));
    }
    if path == root {
        return Some("");
    }
    path.strip_prefix(root)?.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.rs"), "c.rs");
        assert_eq!(base_name("c.rs"), "c.rs");
        assert_eq!(base_name("/abs/dir/"), "dir");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a.py"), "a.py");
        assert_eq!(join_path("src", "a.py"), "src/a.py");
        assert_eq!(join_path("/", "tmp"), "/tmp");
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("/tmp/x/src/a.py", "/tmp/x"), Some("src/a.py"));
        assert_eq!(relative_to("/tmp/x", "/tmp/x"), Some(""));
        assert_eq!(relative_to("/tmp/xy/a.py", "/tmp/x"), None);
        assert_eq!(relative_to("src/a.py", ""), Some("src/a.py"));
        assert_eq!(relative_to("docs/guide/a.md", "docs"), Some("guide/a.md"));
    }
}
