//! Markdown output
//!
//! Each file gets a `# FILE:` heading, an underline as long as the heading,
//! the file text and a closing `---` rule.

use super::{Formatter, normalize_text};

const HEADING: &str = "# FILE: ";
const CLOSING_RULE: &str = "\n---\n";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    fn separator(path: &str) -> String {
        "=".repeat(path.chars().count() + HEADING.len())
    }
}

impl Formatter for MarkdownFormatter {
    fn header(&self, path: &str) -> String {
        self.body(path, "")
    }

    fn body(&self, path: &str, text: &str) -> String {
        format!(
            "{}{}\n{}\n{}{}",
            HEADING,
            path,
            Self::separator(path),
            normalize_text(text),
            CLOSING_RULE
        )
    }

    fn binary(&self, path: &str) -> String {
        self.header(path)
    }

    fn parse(&self, rendered: &str) -> Option<(String, String)> {
        let (heading, rest) = rendered.split_once('\n')?;
        let path = heading.strip_prefix(HEADING)?;
        let (separator, rest) = rest.split_once('\n')?;
        if separator != Self::separator(path) {
            return None;
        }
        let text = rest.strip_suffix(CLOSING_RULE)?;
        Some((path.to_string(), text.to_string()))
    }
}
