//! File rendering
//!
//! This module provides the two output encodings:
//! - `xml` - each file wrapped in `<path>` ... `</path>` tags
//! - `md` - each file under a `# FILE: path` heading with rules
//!
//! Formatters are stateless. For every path and text, `parse(body(path, text))`
//! gives back the path and the text with its trailing newline normalized.

mod markdown;
mod xml;

pub use markdown::MarkdownFormatter;
pub use xml::XmlFormatter;

/// Renders one file into the output stream.
pub trait Formatter: Send + Sync {
    /// Path marker without content.
    fn header(&self, path: &str) -> String;

    /// Path marker wrapping the file's text.
    fn body(&self, path: &str, text: &str) -> String;

    /// Marker for a file whose bytes are not text.
    fn binary(&self, path: &str) -> String;

    /// Inverse of [`Formatter::body`]: recover `(path, text)` from one rendered block.
    fn parse(&self, rendered: &str) -> Option<(String, String)>;
}

/// Output encoding selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tag-delimited: `<path>` ... `</path>`
    #[default]
    Xml,
    /// Markdown headings and rules
    Md,
}

impl OutputFormat {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            OutputFormat::Xml => Box::new(XmlFormatter),
            OutputFormat::Md => Box::new(MarkdownFormatter),
        }
    }
}

/// Make non-empty text end with exactly the newline it needs.
pub fn normalize_text(text: &str) -> std::borrow::Cow<'_, str> {
    if text.is_empty() || text.ends_with('\n') {
        std::borrow::Cow::Borrowed(text)
    } else {
        std::borrow::Cow::Owned(format!("{}\n", text))
    }
}
