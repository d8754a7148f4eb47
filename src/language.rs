//! Programming language detection and comment syntax
//!
//! Used by the emptiness predicate to decide which constructs of a file carry
//! no executable content.

/// Languages whose comment syntax the emptiness predicate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    CSharp,
    Java,
    Kotlin,
    Swift,
    Ruby,
    PHP,
    Shell,
    Toml,
    Yaml,
}

/// Comment markers of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

const C_STYLE: CommentSyntax = CommentSyntax {
    line: &["//"],
    block: Some(("/*", "*/")),
};

const HASH_STYLE: CommentSyntax = CommentSyntax {
    line: &["#"],
    block: None,
};

impl Language {
    /// Detect language from a file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use prin::language::Language;
    ///
    /// assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
    /// assert_eq!(Language::from_extension("py"), Some(Language::Python));
    /// assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScript));
    /// assert_eq!(Language::from_extension("unknown"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Language::Rust),
            "py" | "pyw" | "pyi" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "c" | "h" => Some(Language::C),
            "cpp" | "cxx" | "cc" | "hpp" | "hxx" | "hh" => Some(Language::Cpp),
            "cs" => Some(Language::CSharp),
            "java" => Some(Language::Java),
            "kt" | "kts" => Some(Language::Kotlin),
            "swift" => Some(Language::Swift),
            "rb" => Some(Language::Ruby),
            "php" => Some(Language::PHP),
            "sh" | "bash" | "zsh" | "fish" => Some(Language::Shell),
            "toml" => Some(Language::Toml),
            "yaml" | "yml" => Some(Language::Yaml),
            _ => None,
        }
    }

    /// Detect language from a `/`-separated path.
    ///
    /// # Examples
    ///
    /// ```
    /// use prin::language::Language;
    ///
    /// assert_eq!(Language::from_path("src/main.rs"), Some(Language::Rust));
    /// assert_eq!(Language::from_path("README.md"), None);
    /// assert_eq!(Language::from_path("Makefile"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let name = crate::source::base_name(path);
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(ext)
    }

    pub fn comment_syntax(&self) -> CommentSyntax {
        match self {
            Language::Python
            | Language::Ruby
            | Language::Shell
            | Language::Toml
            | Language::Yaml => HASH_STYLE,
            Language::PHP => CommentSyntax {
                line: &["//", "#"],
                block: Some(("/*", "*/")),
            },
            _ => C_STYLE,
        }
    }
}
