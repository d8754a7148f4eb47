//! Built-in extension sets and exclusion categories

/// Extensions accepted when the caller does not name any.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // Python and shell
    "py", "pyi", "sh", "bash", "zsh", "fish",
    // Web
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "html", "css", "scss", "vue", "svelte",
    // Systems
    "rs", "go", "c", "h", "cpp", "cc", "cxx", "hpp", "hh", "zig",
    // JVM and .NET
    "java", "kt", "kts", "scala", "cs",
    // Others
    "rb", "php", "swift", "lua", "sql", "proto", "graphql",
    // Config and data
    "json", "json*", "toml", "yaml", "yml", "ini", "cfg",
];

/// Documentation extensions, accepted on top of any extension set while docs are on.
pub const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "rst"];

/// Version control, dependency and build-artifact directories, editor and
/// temporary files, logs and secrets. Matched by exact name, or by glob
/// ignoring case.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    // Version control
    ".git",
    ".hg",
    ".svn",
    // Dependencies
    "node_modules",
    "vendor",
    "bower_components",
    ".venv",
    "venv",
    "site-packages",
    "*.egg-info",
    // Build artifacts and caches
    "build",
    "dist",
    "out",
    "bin",
    "target",
    "coverage",
    "__pycache__",
    "*cache*",
    // Editor and temporary files
    "*.swp",
    "*.swo",
    "*.tmp",
    "*~",
    // Compiled objects
    "*.class",
    "*.o",
    "*.so",
    "*.dylib",
    "*.a",
    // Logs
    "logs",
    "*.log",
    // Secrets
    "secrets",
    "*.key",
    "*.pem",
];

/// Test files and directories, dropped unless tests are included.
pub const TEST_EXCLUSIONS: &[&str] = &[
    "test",
    "tests",
    "__tests__",
    "spec",
    "test_*.py",
    "*_test.py",
    "*_test.go",
    "*.spec.ts",
    "*.spec.tsx",
    "*.spec.js",
    "*.test.ts",
    "*.test.tsx",
    "*.test.js",
    "conftest.py",
];

/// Dependency lockfiles, dropped unless lockfiles are included.
pub const LOCK_EXCLUSIONS: &[&str] = &[
    "uv.lock",
    "poetry.lock",
    "Pipfile.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Gemfile.lock",
    "composer.lock",
    "Cargo.lock",
    "go.sum",
    "mix.lock",
    "flake.lock",
];

/// Binary files by extension, dropped unless binaries are included.
pub const BINARY_EXCLUSIONS: &[&str] = &[
    // Executables and bytecode
    "*.pyc", "*.pyo", "*.pyd", "*.exe", "*.dll", "*.app", "*.deb", "*.rpm", "*.wasm",
    // Archives
    "*.zip", "*.tar", "*.gz", "*.tgz", "*.bz2", "*.xz", "*.7z", "*.rar", "*.jar", "*.war", "*.ear",
    // Media
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.bmp", "*.ico", "*.svg", "*.webp", "*.mp3", "*.mp4",
    "*.avi", "*.mov", "*.wav", "*.pdf", "*.ttf", "*.woff", "*.woff2",
    // Databases and data blobs
    "*.db", "*.sqlite", "*.sqlite3", "*.dat", "*.bin", "*.parquet",
];
