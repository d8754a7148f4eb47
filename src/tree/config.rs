//! Configuration types for the walker

/// What to include while walking.
///
/// Built once by the caller and only ever read afterwards.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Accepted extensions (`py`, `.py` and globs like `json*` all work).
    /// Empty means every extension, and extensionless files, are accepted.
    pub extensions: Vec<String>,
    /// Also accept documentation extensions (`md`, `mdx`, `rst`).
    pub include_docs: bool,
    pub include_tests: bool,
    pub include_lock: bool,
    pub include_binary: bool,
    /// Include entries whose name starts with a dot.
    pub include_hidden: bool,
    /// Consult `.gitignore` and friends (local filesystem only).
    pub honor_ignore_files: bool,
    /// Drop every exclusion, built-in and user supplied.
    pub no_exclude: bool,
    /// User exclusions: substrings or glob patterns.
    pub exclude: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            include_docs: true,
            include_tests: false,
            include_lock: false,
            include_binary: false,
            include_hidden: false,
            honor_ignore_files: true,
            no_exclude: false,
            exclude: Vec::new(),
        }
    }
}

/// How to print what passed the filters.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Print path markers only, never file content.
    pub only_headers: bool,
    /// Print files the emptiness predicate would suppress.
    pub include_empty: bool,
    /// Stop after this many files across all roots.
    pub max_files: Option<usize>,
    /// Number of workers fetching file contents of one directory.
    /// 0 = auto-detect (use all available cores)
    /// 1 = sequential (no parallelism)
    /// N = use N worker threads
    pub jobs: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            only_headers: false,
            include_empty: false,
            max_files: None,
            jobs: 1,
        }
    }
}
