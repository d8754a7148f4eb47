//! CLI entry point for prin

use std::collections::HashMap;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use prin::source::{ReqwestClient, RetryPolicy, is_github_locator};
use prin::tree::defaults::DEFAULT_EXTENSIONS;
use prin::{
    FileSystemSource, FilterConfig, GitHubOptions, GitHubSource, OutputFormat, PrintConfig,
    PrinError, Printer, RepoLocator, RootJob, RunSummary, SourceAdapter,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to color diagnostics based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            // Diagnostics go to stderr, so that is the stream that matters
            std::io::stderr().is_terminal()
        }
    }
}

/// Parse a duration string like "30s", "3m" or "1h 30m".
fn parse_duration_string(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "prin")]
#[command(about = "Print the contents of files, directories and GitHub repositories for LLM context")]
#[command(version)]
struct Args {
    /// Paths or GitHub URLs to print (default: current directory)
    roots: Vec<String>,

    /// Only include files with the given extension (repeatable, comma separated).
    /// Replaces the default set of source and documentation extensions.
    #[arg(short = 'e', long = "extension", value_name = "EXT", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Exclude paths matching a substring, `.ext` or glob pattern (repeatable)
    #[arg(short = 'E', long = "exclude", visible_alias = "ignore", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Disable every exclusion, built-in and user supplied
    #[arg(long = "no-exclude")]
    no_exclude: bool,

    /// Include test files and directories
    #[arg(short = 'T', long = "include-tests")]
    include_tests: bool,

    /// Include lockfiles
    #[arg(short = 'K', long = "include-lock")]
    include_lock: bool,

    /// Include binary files (printed as a marker, never as content)
    #[arg(short = 'a', long = "include-binary")]
    include_binary: bool,

    /// Exclude `.md`, `.mdx` and `.rst` files. No effect when -e is given.
    #[arg(short = 'd', long = "no-docs")]
    no_docs: bool,

    /// Include hidden files and directories
    #[arg(short = 'H', long = "hidden")]
    hidden: bool,

    /// Do not honor .gitignore and git exclude files
    #[arg(short = 'I', long = "no-ignore")]
    no_ignore: bool,

    /// Include files that are empty or only hold imports, comments and docstrings
    #[arg(short = 'M', long = "include-empty")]
    include_empty: bool,

    /// Print file paths only, without contents
    #[arg(short = 'l', long = "only-headers")]
    only_headers: bool,

    /// Output format
    #[arg(long = "tag", value_enum, default_value = "xml")]
    tag: OutputFormat,

    /// Stop after printing N files
    #[arg(long = "max-files", value_name = "N")]
    max_files: Option<usize>,

    /// Number of parallel workers fetching file contents
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "0")]
    jobs: usize,

    /// Download remote files to drop semantically empty ones
    #[arg(long = "remote-empty-check")]
    remote_empty_check: bool,

    /// Longest total wait for one rate-limited request, e.g. 30s, 3m
    #[arg(long = "max-wait", value_name = "DURATION", default_value = "3m", value_parser = parse_duration_string)]
    max_wait: Duration,

    /// GitHub token sent with API requests
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn filter_config(&self) -> FilterConfig {
        let custom = !self.extensions.is_empty();
        FilterConfig {
            extensions: if custom {
                self.extensions.clone()
            } else {
                DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
            },
            include_docs: !custom && !self.no_docs,
            include_tests: self.include_tests,
            include_lock: self.include_lock,
            include_binary: self.include_binary,
            include_hidden: self.hidden,
            honor_ignore_files: !self.no_ignore,
            no_exclude: self.no_exclude,
            exclude: self.exclude.clone(),
        }
    }

    fn print_config(&self) -> PrintConfig {
        PrintConfig {
            only_headers: self.only_headers,
            include_empty: self.include_empty,
            max_files: self.max_files,
            jobs: self.jobs,
        }
    }

    fn github_options(&self) -> GitHubOptions {
        GitHubOptions {
            retry: RetryPolicy {
                max_wait: self.max_wait,
                ..RetryPolicy::default()
            },
            empty_check: self.remote_empty_check,
            ..GitHubOptions::default()
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Where each root specifier is read from.
enum Origin {
    Local,
    Remote(usize),
}

fn run(args: &Args) -> Result<RunSummary, PrinError> {
    let roots: Vec<String> = if args.roots.is_empty() {
        vec![".".to_string()]
    } else {
        args.roots.clone()
    };

    // One adapter per repository and ref, shared by every root naming it.
    let mut remotes: Vec<GitHubSource> = Vec::new();
    let mut by_repo: HashMap<String, usize> = HashMap::new();
    let mut client: Option<ReqwestClient> = None;
    let mut origins = Vec::with_capacity(roots.len());
    for root in &roots {
        if !is_github_locator(root) {
            origins.push(Origin::Local);
            continue;
        }
        let locator = RepoLocator::parse(root)?;
        let key = locator.repo_key();
        let index = match by_repo.get(&key) {
            Some(&index) => index,
            None => {
                let http = match &client {
                    Some(c) => c.clone(),
                    None => {
                        let c = ReqwestClient::new(args.github_token.as_deref())?;
                        client = Some(c.clone());
                        c
                    }
                };
                remotes.push(GitHubSource::new(locator, Box::new(http), args.github_options()));
                by_repo.insert(key, remotes.len() - 1);
                remotes.len() - 1
            }
        };
        origins.push(Origin::Remote(index));
    }

    let local = FileSystemSource::new(!args.no_ignore)?;
    let jobs: Vec<RootJob<'_>> = roots
        .iter()
        .zip(&origins)
        .map(|(root, origin)| {
            let source: &dyn SourceAdapter = match origin {
                Origin::Local => &local,
                Origin::Remote(i) => &remotes[*i],
            };
            RootJob::new(source, root.as_str())
        })
        .collect();

    let printer = Printer::new(args.tag.formatter(), &args.filter_config(), args.print_config())?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = printer.run_all(&jobs, &mut out)?;
    out.flush().map_err(PrinError::Output)?;

    for remote in &remotes {
        if remote.retries() > 0 {
            tracing::debug!(repo = %remote.locator().repo_key(), retries = remote.retries(), "rate-limit retries");
        }
    }
    Ok(summary)
}

fn report_skipped(summary: &RunSummary, use_color: bool) {
    let choice = if use_color {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);
    for error in &summary.skipped {
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = write!(stderr, "prin: warning:");
        let _ = stderr.reset();
        let _ = writeln!(stderr, " skipped: {}", error);
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    let use_color = should_use_color(args.color);

    match run(&args) {
        Ok(summary) => report_skipped(&summary, use_color),
        // Downstream closed the pipe (e.g. `prin | head`): nothing left to do
        Err(PrinError::Output(e)) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Err(e) => {
            eprintln!("prin: {}", e);
            process::exit(1);
        }
    }
}
