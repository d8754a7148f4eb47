//! Printer - depth-first traversal that renders files as it goes
//!
//! A run resolves every root first, so a bad root aborts before anything is
//! written. Each root is then walked with an explicit stack: a directory's
//! files are printed before its subdirectories are visited, and both are
//! visited in case-insensitive name order.
//!
//! File contents of one directory may be fetched on a worker pool. Results are
//! always written in listing order, so output does not depend on `jobs`.

use std::collections::HashSet;
use std::io::Write;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{PrinError, Result};
use crate::output::Formatter;
use crate::source::{Entry, ResolvedRoot, SourceAdapter, base_name, relative_to};

use super::config::{FilterConfig, PrintConfig};
use super::filter::FileFilter;
use super::utils::compare_names;

/// One root specifier and the source it should be resolved against.
pub struct RootJob<'a> {
    pub source: &'a dyn SourceAdapter,
    pub spec: String,
}

impl<'a> RootJob<'a> {
    pub fn new(source: &'a dyn SourceAdapter, spec: impl Into<String>) -> Self {
        Self {
            source,
            spec: spec.into(),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files written to the sink.
    pub printed: usize,
    /// Files and directories that could not be read and were skipped.
    pub skipped: Vec<PrinError>,
}

enum Workers {
    Sequential,
    Global,
    Pool(rayon::ThreadPool),
}

/// A file's fate once its bytes (if any) are known.
enum Prepared {
    Suppressed,
    Header,
    Text(String),
    Binary,
    Failed(PrinError),
}

/// A file that passed the filters and is waiting to be rendered.
struct Candidate {
    path: String,
    display: String,
}

/// Mutable state of one run.
struct Walk<'o> {
    out: &'o mut dyn Write,
    printed: HashSet<(String, String)>,
    count: usize,
    skipped: Vec<PrinError>,
}

impl Walk<'_> {
    fn skip(&mut self, error: PrinError) {
        warn!(error = %error, "skipping");
        self.skipped.push(error);
    }

    fn write(&mut self, rendered: &str) -> Result<()> {
        self.out
            .write_all(rendered.as_bytes())
            .map_err(PrinError::Output)
    }
}

/// Walks roots and writes every eligible file through a [`Formatter`].
pub struct Printer {
    formatter: Box<dyn Formatter>,
    filter: FileFilter,
    config: PrintConfig,
    workers: Workers,
}

impl Printer {
    pub fn new(
        formatter: Box<dyn Formatter>,
        filter_config: &FilterConfig,
        config: PrintConfig,
    ) -> Result<Self> {
        let filter = FileFilter::new(filter_config)?;
        let workers = match config.jobs {
            1 => Workers::Sequential,
            // Auto-detect: use rayon's default thread pool
            0 => Workers::Global,
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => Workers::Pool(pool),
                Err(e) => {
                    debug!(error = %e, "falling back to the global thread pool");
                    Workers::Global
                }
            },
        };
        Ok(Self {
            formatter,
            filter,
            config,
            workers,
        })
    }

    /// Print `roots` from a single source. No roots means `.`.
    pub fn run(
        &self,
        source: &dyn SourceAdapter,
        roots: &[String],
        out: &mut dyn Write,
    ) -> Result<RunSummary> {
        let jobs: Vec<RootJob<'_>> = if roots.is_empty() {
            vec![RootJob::new(source, ".")]
        } else {
            roots.iter().map(|r| RootJob::new(source, r.as_str())).collect()
        };
        self.run_all(&jobs, out)
    }

    /// Print roots that may come from different sources, in order.
    pub fn run_all(&self, jobs: &[RootJob<'_>], out: &mut dyn Write) -> Result<RunSummary> {
        let mut resolved = Vec::with_capacity(jobs.len());
        for job in jobs {
            let root = job.source.resolve_root(&job.spec).map_err(|e| match e {
                PrinError::Config { .. } => e,
                other => PrinError::config(job.spec.as_str(), other.to_string()),
            })?;
            debug!(spec = %job.spec, root = ?root, "resolved root");
            resolved.push((job.source, job.source.origin(), root));
        }

        let mut walk = Walk {
            out,
            printed: HashSet::new(),
            count: 0,
            skipped: Vec::new(),
        };
        for (source, origin, root) in &resolved {
            if self.budget_exhausted(&walk) {
                break;
            }
            match root {
                ResolvedRoot::File(path) => self.print_forced(*source, origin, path, &mut walk)?,
                ResolvedRoot::Directory(path) => self.walk_root(*source, origin, path, &mut walk)?,
            }
        }
        walk.out.flush().map_err(PrinError::Output)?;

        Ok(RunSummary {
            printed: walk.count,
            skipped: walk.skipped,
        })
    }

    fn budget_exhausted(&self, walk: &Walk<'_>) -> bool {
        self.config.max_files.is_some_and(|max| walk.count >= max)
    }

    fn print_forced(
        &self,
        source: &dyn SourceAdapter,
        origin: &str,
        path: &str,
        walk: &mut Walk<'_>,
    ) -> Result<()> {
        let candidate = Candidate {
            path: path.to_string(),
            display: base_name(path).to_string(),
        };
        self.print_batch(source, origin, vec![candidate], false, walk)
    }

    fn walk_root(
        &self,
        source: &dyn SourceAdapter,
        origin: &str,
        root: &str,
        walk: &mut Walk<'_>,
    ) -> Result<()> {
        let mut stack = vec![root.to_string()];

        while let Some(dir) = stack.pop() {
            if self.budget_exhausted(walk) {
                return Ok(());
            }
            let entries = match source.list_dir(&dir) {
                Ok(entries) => entries,
                Err(PrinError::NotADirectory(_)) if dir == root => {
                    return self.print_forced(source, origin, root, walk);
                }
                Err(e) => {
                    walk.skip(e);
                    continue;
                }
            };

            let (mut dirs, mut files): (Vec<Entry>, Vec<Entry>) = entries
                .into_iter()
                .filter(|e| e.is_dir() || e.is_file())
                .partition(Entry::is_dir);
            dirs.sort_by(compare_names);
            files.sort_by(compare_names);

            let candidates: Vec<Candidate> = files
                .into_iter()
                .filter_map(|entry| {
                    let display = relative_to(&entry.path, root)
                        .unwrap_or(entry.name.as_str())
                        .to_string();
                    self.filter
                        .accepts_file(&display, &entry.name)
                        .then_some(Candidate {
                            path: entry.path,
                            display,
                        })
                })
                .collect();
            self.print_batch(source, origin, candidates, true, walk)?;

            for sub in dirs.iter().rev() {
                let rel = relative_to(&sub.path, root).unwrap_or(sub.name.as_str());
                if self.filter.accepts_dir(rel, &sub.name) {
                    stack.push(sub.path.clone());
                } else {
                    debug!(dir = %sub.path, "pruned directory");
                }
            }
        }
        Ok(())
    }

    /// Fetch and print candidates in order, stopping once the file budget is spent.
    fn print_batch(
        &self,
        source: &dyn SourceAdapter,
        origin: &str,
        candidates: Vec<Candidate>,
        suppress_empty: bool,
        walk: &mut Walk<'_>,
    ) -> Result<()> {
        let pending: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| !walk.printed.contains(&(origin.to_string(), c.path.clone())))
            .collect();
        let check_empty =
            suppress_empty && !self.config.include_empty && source.supports_empty_check();
        let only_headers = self.config.only_headers;

        let mut start = 0;
        while start < pending.len() {
            // Never fetch more files than may still be printed.
            let window = match self.config.max_files {
                Some(max) => max.saturating_sub(walk.count),
                None => pending.len(),
            };
            if window == 0 {
                return Ok(());
            }
            let end = pending.len().min(start + window);
            let chunk = &pending[start..end];
            start = end;

            let prepared = self.prepare(source, chunk, check_empty, only_headers);
            for (candidate, outcome) in chunk.iter().zip(prepared) {
                let rendered = match outcome {
                    Prepared::Suppressed => {
                        debug!(path = %candidate.path, "suppressed empty file");
                        continue;
                    }
                    Prepared::Failed(e) => {
                        walk.skip(e);
                        continue;
                    }
                    Prepared::Header => self.formatter.header(&candidate.display),
                    Prepared::Binary => self.formatter.binary(&candidate.display),
                    Prepared::Text(text) => self.formatter.body(&candidate.display, &text),
                };
                walk.write(&rendered)?;
                walk.printed
                    .insert((origin.to_string(), candidate.path.clone()));
                walk.count += 1;
            }
        }
        Ok(())
    }

    fn prepare(
        &self,
        source: &dyn SourceAdapter,
        chunk: &[Candidate],
        check_empty: bool,
        only_headers: bool,
    ) -> Vec<Prepared> {
        let run = |c: &Candidate| prepare_file(source, &c.path, check_empty, only_headers);
        match &self.workers {
            Workers::Sequential => chunk.iter().map(run).collect(),
            Workers::Global => chunk.par_iter().map(run).collect(),
            Workers::Pool(pool) => pool.install(|| chunk.par_iter().map(run).collect()),
        }
    }
}

/// Everything about one file that needs I/O: emptiness and contents.
fn prepare_file(
    source: &dyn SourceAdapter,
    path: &str,
    check_empty: bool,
    only_headers: bool,
) -> Prepared {
    if check_empty {
        match source.is_empty(path) {
            Ok(true) => return Prepared::Suppressed,
            Ok(false) => {}
            Err(e) => return Prepared::Failed(e),
        }
    }
    if only_headers {
        if check_empty {
            source.release(path);
        }
        return Prepared::Header;
    }
    match source.read_file_bytes(path) {
        Ok(bytes) => classify(bytes),
        Err(e) => Prepared::Failed(e),
    }
}

/// Text is NUL-free valid UTF-8; everything else renders as binary.
fn classify(bytes: Vec<u8>) -> Prepared {
    if bytes.contains(&0) || content_inspector::inspect(&bytes).is_binary() {
        return Prepared::Binary;
    }
    match String::from_utf8(bytes) {
        Ok(text) => Prepared::Text(text),
        Err(_) => Prepared::Binary,
    }
}
