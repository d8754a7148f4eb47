//! Inclusion and exclusion decisions for entries
//!
//! Every decision is a pure function of the entry's root-relative path, its
//! name and the [`FilterConfig`] the filter was compiled from.

use glob::{MatchOptions, Pattern};

use crate::error::{PrinError, Result};

use super::config::FilterConfig;
use super::defaults::{
    BINARY_EXCLUSIONS, DEFAULT_EXCLUSIONS, DOC_EXTENSIONS, LOCK_EXCLUSIONS, TEST_EXCLUSIONS,
};
use super::utils::{extension_of, is_glob, stem_of};

const IGNORE_CASE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// One compiled exclusion rule.
#[derive(Debug)]
enum Rule {
    /// Built-in rule: exact entry name.
    Name(String),
    /// Built-in rule: case-insensitive glob against the entry name only.
    NameGlob(Pattern),
    /// User glob: matches the path, the name or the stem.
    Glob(Pattern),
    /// User `.ext` rule: the name ends with it.
    Extension(String),
    /// User literal: equality with name/stem/path, or containment in the path.
    Substring(String),
}

impl Rule {
    fn builtin(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(p) if is_glob(pattern) => Rule::NameGlob(p),
            _ => Rule::Name(pattern.to_string()),
        }
    }

    fn user(pattern: &str) -> Result<Self> {
        if is_glob(pattern) {
            return Pattern::new(pattern)
                .map(Rule::Glob)
                .map_err(|e| PrinError::config(pattern, format!("invalid glob: {}", e)));
        }
        if pattern.starts_with('.') && !pattern.contains('/') && pattern.len() > 1 {
            return Ok(Rule::Extension(pattern.to_string()));
        }
        Ok(Rule::Substring(pattern.trim_end_matches('/').to_string()))
    }

    fn matches(&self, rel_path: &str, name: &str) -> bool {
        match self {
            Rule::Name(n) => name == n,
            Rule::NameGlob(p) => p.matches_with(name, IGNORE_CASE),
            Rule::Glob(p) => p.matches(rel_path) || p.matches(name) || p.matches(stem_of(name)),
            Rule::Extension(ext) => name == ext || name.ends_with(ext.as_str()),
            Rule::Substring(s) => {
                !s.is_empty()
                    && (name == s || stem_of(name) == s || rel_path == s || rel_path.contains(s.as_str()))
            }
        }
    }
}

/// Accepted-extension rule, compared against the lowercased extension.
#[derive(Debug)]
enum ExtensionRule {
    Exact(String),
    Glob(Pattern),
}

impl ExtensionRule {
    fn parse(raw: &str) -> Result<Self> {
        let normalized = raw
            .trim()
            .trim_start_matches("*.")
            .trim_start_matches('.')
            .to_lowercase();
        if normalized.is_empty() {
            return Err(PrinError::config(raw, "empty extension"));
        }
        if is_glob(&normalized) {
            Pattern::new(&normalized)
                .map(ExtensionRule::Glob)
                .map_err(|e| PrinError::config(raw, format!("invalid extension glob: {}", e)))
        } else {
            Ok(ExtensionRule::Exact(normalized))
        }
    }

    fn matches(&self, ext: &str) -> bool {
        match self {
            ExtensionRule::Exact(e) => e == ext,
            ExtensionRule::Glob(p) => p.matches(ext),
        }
    }
}

/// Compiled form of a [`FilterConfig`].
#[derive(Debug)]
pub struct FileFilter {
    rules: Vec<Rule>,
    extensions: Vec<ExtensionRule>,
    include_docs: bool,
    include_hidden: bool,
}

impl FileFilter {
    /// Compile a configuration; malformed patterns are configuration errors.
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let mut rules = Vec::new();
        if !config.no_exclude {
            for pattern in &config.exclude {
                rules.push(Rule::user(pattern)?);
            }
            let mut builtin: Vec<&[&str]> = vec![DEFAULT_EXCLUSIONS];
            if !config.include_tests {
                builtin.push(TEST_EXCLUSIONS);
            }
            if !config.include_lock {
                builtin.push(LOCK_EXCLUSIONS);
            }
            if !config.include_binary {
                builtin.push(BINARY_EXCLUSIONS);
            }
            rules.extend(builtin.into_iter().flatten().map(|p| Rule::builtin(p)));
        }

        let extensions = config
            .extensions
            .iter()
            .map(|e| ExtensionRule::parse(e))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            extensions,
            include_docs: config.include_docs,
            include_hidden: config.include_hidden,
        })
    }

    /// Whether any exclusion rule matches the entry.
    pub fn is_excluded(&self, rel_path: &str, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(rel_path, name))
    }

    /// Dot-prefixed names are hidden unless hidden entries are included.
    pub fn is_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Whether a file name passes the extension filter.
    pub fn matches_extension(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = extension_of(name) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.extensions.iter().any(|rule| rule.matches(&ext))
            || (self.include_docs && DOC_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Directories are only subject to path exclusion and hidden status.
    pub fn accepts_dir(&self, rel_path: &str, name: &str) -> bool {
        !self.is_hidden(name) && !self.is_excluded(rel_path, name)
    }

    pub fn accepts_file(&self, rel_path: &str, name: &str) -> bool {
        !self.is_hidden(name) && !self.is_excluded(rel_path, name) && self.matches_extension(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(config: FilterConfig) -> FileFilter {
        FileFilter::new(&config).unwrap()
    }

    #[test]
    fn test_substring_exclusion_matches_path() {
        let f = filter(FilterConfig {
            exclude: vec!["o/b".into()],
            ..Default::default()
        });
        assert!(f.is_excluded("foo/bar/baz.py", "baz.py"));
        assert!(!f.is_excluded("foo/car/baz.py", "baz.py"));
    }

    #[test]
    fn test_glob_exclusion_matches_name_path_and_stem() {
        let f = filter(FilterConfig {
            exclude: vec!["LICENS*".into(), "src/*.gen.ts".into()],
            ..Default::default()
        });
        assert!(f.is_excluded("LICENSE", "LICENSE"));
        assert!(f.is_excluded("src/api.gen.ts", "api.gen.ts"));
        assert!(!f.is_excluded("lib/api.gen.ts", "api.gen.ts"));
    }

    #[test]
    fn test_extension_exclusion_is_strict() {
        let f = filter(FilterConfig {
            exclude: vec![".py".into()],
            no_exclude: false,
            ..Default::default()
        });
        assert!(f.is_excluded("a/foo.py", "foo.py"));
        assert!(!f.is_excluded("a/foo.pyx", "foo.pyx"));
    }

    #[test]
    fn test_builtin_rules_match_whole_names_only() {
        let f = filter(FilterConfig::default());
        assert!(f.is_excluded("node_modules", "node_modules"));
        assert!(f.is_excluded("pkg/target", "target"));
        assert!(f.is_excluded("Cargo.lock", "Cargo.lock"));
        assert!(f.is_excluded("img/logo.png", "logo.png"));
        assert!(!f.is_excluded("src/layout.py", "layout.py"));
        assert!(!f.is_excluded("src/binary.rs", "binary.rs"));
    }

    #[test]
    fn test_builtin_globs_ignore_case() {
        let f = filter(FilterConfig::default());
        assert!(f.is_excluded("CACHE", "CACHE"));
        assert!(f.is_excluded("src/LruCACHE.py", "LruCACHE.py"));
        assert!(f.is_excluded("pkg/.Cache", ".Cache"));
        assert!(f.is_excluded("img/LOGO.PNG", "LOGO.PNG"));
        // Exact-name rules stay case-sensitive
        assert!(!f.is_excluded("Build", "Build"));
    }

    #[test]
    fn test_category_toggles() {
        let f = filter(FilterConfig::default());
        assert!(f.is_excluded("tests", "tests"));
        assert!(f.is_excluded("app/test_api.py", "test_api.py"));
        assert!(f.is_excluded("yarn.lock", "yarn.lock"));

        let f = filter(FilterConfig {
            include_tests: true,
            include_lock: true,
            include_binary: true,
            ..Default::default()
        });
        assert!(!f.is_excluded("tests", "tests"));
        assert!(!f.is_excluded("yarn.lock", "yarn.lock"));
        assert!(!f.is_excluded("logo.png", "logo.png"));
        // Defaults still apply
        assert!(f.is_excluded("node_modules", "node_modules"));
    }

    #[test]
    fn test_user_excludes_layer_on_builtins() {
        let f = filter(FilterConfig {
            exclude: vec!["generated".into()],
            ..Default::default()
        });
        assert!(f.is_excluded("src/generated/a.rs", "a.rs"));
        assert!(f.is_excluded("dist", "dist"));
    }

    #[test]
    fn test_no_exclude_drops_everything() {
        let f = filter(FilterConfig {
            exclude: vec!["src".into()],
            no_exclude: true,
            ..Default::default()
        });
        assert!(!f.is_excluded("src/a.rs", "a.rs"));
        assert!(!f.is_excluded("node_modules", "node_modules"));
    }

    #[test]
    fn test_extension_inclusion() {
        let f = filter(FilterConfig {
            extensions: vec!["py".into(), ".TOML".into(), "json*".into()],
            include_docs: false,
            ..Default::default()
        });
        assert!(f.matches_extension("a.py"));
        assert!(f.matches_extension("A.PY"));
        assert!(f.matches_extension("pyproject.toml"));
        assert!(f.matches_extension("data.json5"));
        assert!(!f.matches_extension("readme.md"));
        assert!(!f.matches_extension("LICENSE"));
    }

    #[test]
    fn test_docs_extend_extension_set() {
        let f = filter(FilterConfig {
            extensions: vec!["py".into()],
            include_docs: true,
            ..Default::default()
        });
        assert!(f.matches_extension("readme.md"));
        assert!(f.matches_extension("index.rst"));
        assert!(!f.matches_extension("notes.txt"));
    }

    #[test]
    fn test_empty_extension_set_accepts_everything() {
        let f = filter(FilterConfig::default());
        assert!(f.matches_extension("LICENSE"));
        assert!(f.matches_extension("notes.txt"));
    }

    #[test]
    fn test_hidden_entries() {
        let f = filter(FilterConfig::default());
        assert!(f.is_hidden(".env"));
        assert!(!f.accepts_dir(".github", ".github"));
        assert!(!f.is_hidden("env"));

        let f = filter(FilterConfig {
            include_hidden: true,
            ..Default::default()
        });
        assert!(!f.is_hidden(".env"));
        assert!(f.accepts_dir(".github", ".github"));
        // Version control directories stay excluded even when hidden entries are shown
        assert!(!f.accepts_dir(".git", ".git"));
    }

    #[test]
    fn test_invalid_patterns_are_config_errors() {
        let err = FileFilter::new(&FilterConfig {
            exclude: vec!["[".into()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PrinError::Config { .. }));

        let err = FileFilter::new(&FilterConfig {
            extensions: vec![".".into()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PrinError::Config { .. }));
    }
}
