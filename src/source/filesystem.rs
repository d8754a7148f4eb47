//! Local filesystem adapter

use std::io::ErrorKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use tracing::debug;

use crate::emptiness::is_blob_semantically_empty;
use crate::error::{PrinError, Result};
use crate::git::IgnoreRules;

use super::{Entry, EntryKind, ResolvedRoot, SourceAdapter, join_path};

/// Reads directories and files from the local disk.
///
/// Paths handed out are canonical absolute paths in `/` form.
pub struct FileSystemSource {
    cwd: PathBuf,
    ignore: Option<IgnoreRules>,
}

impl FileSystemSource {
    /// Resolve relative roots against the process working directory.
    pub fn new(honor_ignore_files: bool) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PrinError::config(".", format!("cannot read working directory: {}", e)))?;
        Ok(Self::with_cwd(cwd, honor_ignore_files))
    }

    /// Resolve relative roots against `cwd`.
    pub fn with_cwd(cwd: impl Into<PathBuf>, honor_ignore_files: bool) -> Self {
        Self {
            cwd: cwd.into(),
            ignore: honor_ignore_files.then(IgnoreRules::new),
        }
    }
}

fn to_posix(path: &Path) -> String {
    let s = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(MAIN_SEPARATOR, "/")
    }
}

fn io_error(path: &str, source: std::io::Error) -> PrinError {
    PrinError::Io {
        path: path.to_string(),
        source,
    }
}

impl SourceAdapter for FileSystemSource {
    fn origin(&self) -> String {
        "file".to_string()
    }

    fn resolve_root(&self, spec: &str) -> Result<ResolvedRoot> {
        let spec = if spec.is_empty() { "." } else { spec };
        let joined = self.cwd.join(spec);
        let canonical = joined
            .canonicalize()
            .map_err(|e| PrinError::config(spec, e.to_string()))?;
        let metadata = canonical
            .metadata()
            .map_err(|e| PrinError::config(spec, e.to_string()))?;

        let path = to_posix(&canonical);
        if metadata.is_dir() {
            Ok(ResolvedRoot::Directory(path))
        } else if metadata.is_file() {
            Ok(ResolvedRoot::File(path))
        } else {
            Err(PrinError::config(spec, "not a regular file or directory"))
        }
    }

    fn list_dir(&self, dir: &str) -> Result<Vec<Entry>> {
        let dir_path = PathBuf::from(dir);
        let read = match std::fs::read_dir(&dir_path) {
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::NotADirectory => {
                return Err(PrinError::NotADirectory(dir.to_string()));
            }
            Err(e) => return Err(io_error(dir, e)),
        };

        let mut entries = Vec::new();
        let mut ignored = 0usize;
        for item in read {
            let item = item.map_err(|e| io_error(dir, e))?;
            let file_type = item.file_type().map_err(|e| io_error(dir, e))?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            if let Some(rules) = &self.ignore {
                if rules.is_ignored(&dir_path, &item.path(), kind == EntryKind::Directory) {
                    ignored += 1;
                    continue;
                }
            }

            let name = item.file_name().to_string_lossy().into_owned();
            entries.push(Entry::new(join_path(dir, &name), name, kind));
        }

        debug!(dir, entries = entries.len(), ignored, "listed directory");
        Ok(entries)
    }

    fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| io_error(path, e))
    }

    fn supports_empty_check(&self) -> bool {
        true
    }

    fn is_empty(&self, path: &str) -> Result<bool> {
        let blob = self.read_file_bytes(path)?;
        Ok(is_blob_semantically_empty(path, &blob))
    }
}
