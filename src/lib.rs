//! Prin - print the contents of local trees and GitHub repositories for LLM input

pub mod emptiness;
pub mod error;
pub mod git;
pub mod language;
pub mod output;
pub mod source;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{PrinError, Result};
pub use output::{Formatter, MarkdownFormatter, OutputFormat, XmlFormatter};
pub use source::{FileSystemSource, GitHubOptions, GitHubSource, RepoLocator, SourceAdapter};
pub use tree::{FilterConfig, PrintConfig, Printer, RootJob, RunSummary};
