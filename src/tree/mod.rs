//! Traversal engine
//!
//! This module owns everything between "here are some roots" and "here is the
//! rendered text":
//!
//! - `FilterConfig`/`PrintConfig`: what to include and how to print it
//! - `FileFilter`: per-entry inclusion and exclusion decisions
//! - `Printer`: depth-first walk over any `SourceAdapter`

mod config;
pub mod defaults;
mod filter;
mod utils;
mod walker;

pub use config::{FilterConfig, PrintConfig};
pub use filter::FileFilter;
pub use walker::{Printer, RootJob, RunSummary};
