//! Content-aware emptiness predicate
//!
//! A file is "empty" when nothing with executable meaning remains after
//! removing non-semantic content:
//!
//! - **Python**: comments, docstrings and other bare string statements,
//!   `import`/`from ... import` statements and `__all__` assignments
//! - **JavaScript/TypeScript**: comments, `import` statements, `export ... from`
//!   re-exports and `"use strict"` directives
//! - **Go**: comments, the `package` clause and `import` declarations
//! - **Rust**: comments, `use` declarations and `extern crate`
//! - **Other known languages**: comments only
//! - **Unknown content**: whitespace only
//!
//! The scanners are line-oriented and approximate. Whenever they are unsure
//! they keep content, so a misparse can only make a file print, never hide it.

use crate::language::{CommentSyntax, Language};

/// Decide emptiness from raw bytes.
///
/// Zero-length files are empty. Anything with a NUL byte or that is not valid
/// UTF-8 is treated as having content.
pub fn is_blob_semantically_empty(path: &str, blob: &[u8]) -> bool {
    if blob.is_empty() {
        return true;
    }
    if blob.contains(&0) {
        return false;
    }
    match std::str::from_utf8(blob) {
        Ok(text) => is_text_semantically_empty(path, text),
        Err(_) => false,
    }
}

/// Decide emptiness of decoded text; `path` selects the language rules.
pub fn is_text_semantically_empty(path: &str, text: &str) -> bool {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return true;
    }

    let Some(language) = Language::from_path(path) else {
        return false;
    };

    match language {
        Language::Python => python_is_empty(text),
        other => {
            let code = strip_comments(text, other.comment_syntax(), other);
            match other {
                Language::Rust => strip_statements(&code, rust_statement_end).is_empty(),
                Language::JavaScript | Language::TypeScript => {
                    strip_statements(&code, js_statement_end).is_empty()
                }
                Language::Go => strip_statements(&code, go_statement_end).is_empty(),
                _ => code.trim().is_empty(),
            }
        }
    }
}

// ============================================================================
// Comment stripping for C-style and hash-style languages
// ============================================================================

/// Remove comments, keeping string literals and line structure intact.
fn strip_comments(text: &str, syntax: CommentSyntax, language: Language) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut segment_start = 0;
    let backtick_strings = matches!(language, Language::JavaScript | Language::TypeScript);

    while i < bytes.len() {
        let rest = &text[i..];

        if let Some((open, close)) = syntax.block {
            if rest.starts_with(open) {
                out.push_str(&text[segment_start..i]);
                let body_end = rest[open.len()..]
                    .find(close)
                    .map(|end| i + open.len() + end + close.len())
                    .unwrap_or(bytes.len());
                // Keep newlines so statement boundaries survive.
                out.extend(text[i..body_end].chars().filter(|c| *c == '\n'));
                i = body_end;
                segment_start = i;
                continue;
            }
        }

        if syntax.line.iter().any(|marker| rest.starts_with(marker)) {
            out.push_str(&text[segment_start..i]);
            i = rest.find('\n').map(|end| i + end).unwrap_or(bytes.len());
            segment_start = i;
            continue;
        }

        match bytes[i] {
            b'"' | b'\'' => i = skip_quoted(bytes, i, bytes[i]),
            b'`' if backtick_strings => i = skip_quoted(bytes, i, b'`'),
            _ => i += rest.chars().next().map_or(1, char::len_utf8),
        }
    }

    out.push_str(&text[segment_start.min(bytes.len())..]);
    out
}

/// Index just past the closing quote of a literal starting at `start`.
///
/// An unterminated literal ends at the end of its line.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Repeatedly remove leading statements recognized by `statement_end`.
///
/// Returns whatever is left, trimmed.
fn strip_statements(code: &str, statement_end: fn(&str) -> Option<usize>) -> &str {
    let mut rest = code.trim();
    while !rest.is_empty() {
        match statement_end(rest) {
            Some(end) => rest = rest[end..].trim_start(),
            None => break,
        }
    }
    rest
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword).is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '(' || c == '"' || c == '\'')
    })
}

/// Whether `text` ends with `keyword` as a whole word.
fn ends_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_suffix(keyword).is_some_and(|before| {
        !before.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$')
    })
}

fn rust_statement_end(code: &str) -> Option<usize> {
    let body = code
        .strip_prefix("pub(crate) ")
        .or_else(|| code.strip_prefix("pub "))
        .unwrap_or(code);
    if starts_with_keyword(body, "use") || starts_with_keyword(body, "extern crate") {
        return code.find(';').map(|i| i + 1);
    }
    None
}

fn js_statement_end(code: &str) -> Option<usize> {
    let bytes = code.as_bytes();
    let directive = ["\"use strict\"", "'use strict'"]
        .iter()
        .find(|d| code.starts_with(*d))
        .map(|d| d.len());
    if let Some(len) = directive {
        return Some(skip_semicolon(code, len));
    }

    // The statement ends with its module specifier string, which must follow
    // `from` (or a bare `import` for side-effect imports).
    let quote_at = code.find(['"', '\''])?;
    let head = code[..quote_at].trim_end();
    let is_import = starts_with_keyword(code, "import")
        && !code.starts_with("import(")
        && (head == "import" || ends_with_keyword(head, "from"));
    let is_reexport = starts_with_keyword(code, "export") && ends_with_keyword(head, "from");
    if !(is_import || is_reexport) {
        return None;
    }

    let end = skip_quoted(bytes, quote_at, bytes[quote_at]);
    Some(skip_semicolon(code, end))
}

fn go_statement_end(code: &str) -> Option<usize> {
    if starts_with_keyword(code, "package") {
        return Some(code.find('\n').unwrap_or(code.len()));
    }
    if starts_with_keyword(code, "import") {
        let rest = code["import".len()..].trim_start();
        let offset = code.len() - rest.len();
        if rest.starts_with('(') {
            return rest.find(')').map(|i| offset + i + 1);
        }
        return Some(code.find('\n').unwrap_or(code.len()));
    }
    None
}

fn skip_semicolon(code: &str, end: usize) -> usize {
    let after = &code[end..];
    let trimmed = after.trim_start_matches([' ', '\t']);
    if trimmed.starts_with(';') {
        end + (after.len() - trimmed.len()) + 1
    } else {
        end
    }
}

// ============================================================================
// Python
// ============================================================================

/// Tracks open triple-quoted strings and bracket depth across lines.
#[derive(Default)]
struct PyScan {
    triple: Option<u8>,
    depth: i32,
}

impl PyScan {
    /// Consume one physical line; returns true if the logical line continues.
    fn feed(&mut self, line: &str) -> bool {
        let b = line.as_bytes();
        let mut i = 0;
        let mut code_end = b.len();
        while i < b.len() {
            if let Some(q) = self.triple {
                if b[i] == b'\\' {
                    i += 2;
                } else if is_triple(b, i, q) {
                    self.triple = None;
                    i += 3;
                } else {
                    i += 1;
                }
                continue;
            }
            match b[i] {
                b'#' => {
                    code_end = i;
                    break;
                }
                q @ (b'"' | b'\'') => {
                    if is_triple(b, i, q) {
                        self.triple = Some(q);
                        i += 3;
                    } else {
                        i = skip_quoted(b, i, q);
                    }
                }
                b'(' | b'[' | b'{' => {
                    self.depth += 1;
                    i += 1;
                }
                b')' | b']' | b'}' => {
                    self.depth -= 1;
                    i += 1;
                }
                _ => i += 1,
            }
        }
        let explicit_join = self.triple.is_none() && line[..code_end.min(line.len())].trim_end().ends_with('\\');
        self.triple.is_some() || self.depth > 0 || explicit_join
    }
}

fn is_triple(b: &[u8], i: usize, q: u8) -> bool {
    b.get(i) == Some(&q) && b.get(i + 1) == Some(&q) && b.get(i + 2) == Some(&q)
}

/// Split Python source into logical statements (joined physical lines).
fn python_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut scan = PyScan::default();
    let mut current = String::new();

    for line in text.lines() {
        if current.is_empty() {
            let t = line.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
        } else {
            current.push('\n');
        }
        current.push_str(line);
        if !scan.feed(line) {
            statements.push(std::mem::take(&mut current));
            scan = PyScan::default();
        }
    }
    if !current.trim().is_empty() {
        statements.push(current);
    }
    statements
}

fn python_is_empty(text: &str) -> bool {
    python_statements(text).iter().all(|stmt| {
        python_simple_statements(stmt)
            .into_iter()
            .map(str::trim)
            .all(|part| part.is_empty() || is_python_vacuous_statement(part))
    })
}

/// Split a logical statement on `;` outside strings, brackets and comments.
fn python_simple_statements(stmt: &str) -> Vec<&str> {
    let b = stmt.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0i32;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'#' => i = stmt[i..].find('\n').map_or(b.len(), |n| i + n),
            q @ (b'"' | b'\'') => {
                i = if is_triple(b, i, q) {
                    skip_triple(b, i, q)
                } else {
                    skip_quoted(b, i, q)
                };
            }
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                i += 1;
            }
            b';' if depth <= 0 => {
                parts.push(&stmt[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&stmt[start..]);
    parts
}

/// Index just past the triple quote closing the string opened at `start`,
/// or the end of input when it never closes.
fn skip_triple(b: &[u8], start: usize, q: u8) -> usize {
    let mut i = start + 3;
    while i < b.len() {
        if b[i] == b'\\' {
            i += 2;
        } else if is_triple(b, i, q) {
            return i + 3;
        } else {
            i += 1;
        }
    }
    b.len()
}

fn is_python_vacuous_statement(stmt: &str) -> bool {
    if stmt.starts_with("import ") || (stmt.starts_with("from ") && stmt.contains(" import")) {
        return true;
    }
    if let Some(rest) = stmt.strip_prefix("__all__") {
        let rest = rest.trim_start();
        return rest.starts_with('=') || rest.starts_with("+=") || rest.starts_with(':');
    }
    is_bare_string(stmt)
}

/// A statement made of nothing but one string literal (optionally followed by a comment).
fn is_bare_string(stmt: &str) -> bool {
    let body = stmt.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B']);
    if stmt.len() - body.len() > 2 {
        return false;
    }
    let b = body.as_bytes();
    let Some(&q) = b.first() else {
        return false;
    };
    if q != b'"' && q != b'\'' {
        return false;
    }

    let end = if is_triple(b, 0, q) {
        let end = skip_triple(b, 0, q);
        if end < 6 || !is_triple(b, end - 3, q) {
            return false;
        }
        end
    } else {
        let end = skip_quoted(b, 0, q);
        if b.get(end - 1) != Some(&q) || end < 2 {
            return false;
        }
        end
    };

    let remainder = body[end.min(body.len())..].trim();
    remainder.is_empty() || remainder.starts_with('#')
}
