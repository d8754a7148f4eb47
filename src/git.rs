//! Git ignore-file rules for the local filesystem
//!
//! Rules come from the user's global excludes file, the enclosing repository's
//! `.git/info/exclude`, and every `.gitignore` from the repository work tree
//! down to the directory being listed. Deeper files take precedence, and a
//! `!pattern` whitelist inside one file is honored. This is a simplified model
//! of git's behavior, not a re-implementation of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use git2::Repository;
use ignore::Match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;

/// Ordered matchers applying to one directory, outermost first.
#[derive(Default)]
struct DirRules {
    matchers: Vec<Arc<Gitignore>>,
}

/// Lazily built ignore rules, cached per listed directory.
pub struct IgnoreRules {
    global: Option<Arc<Gitignore>>,
    cache: Mutex<HashMap<PathBuf, Arc<DirRules>>>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        let (global, err) = Gitignore::global();
        if let Some(err) = err {
            debug!(error = %err, "could not read global git excludes");
        }
        Self {
            global: (!global.is_empty()).then(|| Arc::new(global)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `path`, a direct child of `dir`, is ignored.
    pub fn is_ignored(&self, dir: &Path, path: &Path, is_dir: bool) -> bool {
        let rules = self.rules_for(dir);
        for matcher in rules.matchers.iter().rev() {
            match matcher.matched(path, is_dir) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => {}
            }
        }
        false
    }

    fn rules_for(&self, dir: &Path) -> Arc<DirRules> {
        if let Some(rules) = self.cached(dir) {
            return rules;
        }

        // A directory inherits its parent's rules unless it starts a new repository.
        let inherited = match dir.parent() {
            Some(parent) if !dir.join(".git").exists() => self.cached(parent),
            _ => None,
        };
        let rules = match inherited {
            Some(parent) => {
                let mut matchers = parent.matchers.clone();
                matchers.extend(load_gitignore(dir));
                DirRules { matchers }
            }
            None => self.discover(dir),
        };

        let rules = Arc::new(rules);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(dir.to_path_buf(), Arc::clone(&rules));
        }
        rules
    }

    fn cached(&self, dir: &Path) -> Option<Arc<DirRules>> {
        self.cache.lock().ok()?.get(dir).cloned()
    }

    /// Build rules for a directory with no cached parent.
    fn discover(&self, dir: &Path) -> DirRules {
        let mut matchers: Vec<Arc<Gitignore>> = self.global.iter().cloned().collect();

        let Ok(repo) = Repository::discover(dir) else {
            matchers.extend(load_gitignore(dir));
            return DirRules { matchers };
        };
        let Some(workdir) = repo.workdir().and_then(|w| w.canonicalize().ok()) else {
            matchers.extend(load_gitignore(dir));
            return DirRules { matchers };
        };
        debug!(workdir = %workdir.display(), "found enclosing git repository");

        let exclude = repo.path().join("info").join("exclude");
        if exclude.is_file() {
            let mut builder = GitignoreBuilder::new(&workdir);
            builder.add(&exclude);
            if let Ok(gi) = builder.build() {
                matchers.push(Arc::new(gi));
            }
        }

        // Work tree root down to `dir`, inclusive.
        let mut chain: Vec<&Path> = dir
            .ancestors()
            .take_while(|a| a.starts_with(&workdir))
            .collect();
        chain.reverse();
        for ancestor in chain {
            matchers.extend(load_gitignore(ancestor));
        }
        DirRules { matchers }
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new()
    }
}

fn load_gitignore(dir: &Path) -> Option<Arc<Gitignore>> {
    let path = dir.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let (gi, err) = Gitignore::new(&path);
    if let Some(err) = err {
        debug!(path = %path.display(), error = %err, "partially invalid .gitignore");
    }
    (!gi.is_empty()).then(|| Arc::new(gi))
}
