//! Tag-delimited output

use super::{Formatter, normalize_text};

/// Wraps each file in an opening and a matching closing path tag.
///
/// ```text
/// <src/main.rs>
/// fn main() {}
/// </src/main.rs>
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFormatter;

impl Formatter for XmlFormatter {
    fn header(&self, path: &str) -> String {
        format!("<{}>\n</{}>\n", path, path)
    }

    fn body(&self, path: &str, text: &str) -> String {
        format!("<{}>\n{}</{}>\n", path, normalize_text(text), path)
    }

    fn binary(&self, path: &str) -> String {
        format!("<{}/>\n", path)
    }

    fn parse(&self, rendered: &str) -> Option<(String, String)> {
        let (open, rest) = rendered.split_once('\n')?;
        let path = open.strip_prefix('<')?.strip_suffix('>')?;
        let closing = format!("</{}>\n", path);
        let text = rest.strip_suffix(closing.as_str())?;
        Some((path.to_string(), text.to_string()))
    }
}
