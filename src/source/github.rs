//! GitHub repository adapter
//!
//! Lists and reads a repository through the REST contents API, one directory
//! per request. File bytes come from the inline base64 payload when the API
//! returned one, then the raw download URL, then the git blob API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex, OnceLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::emptiness::is_blob_semantically_empty;
use crate::error::{PrinError, Result};

use super::http::{HttpClient, RetryPolicy, get_with_retry};
use super::{Entry, EntryKind, ResolvedRoot, SourceAdapter, base_name};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

static LOCATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:git\+)?(?:https?://)?(?:www\.)?github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?(?:/(?:tree|blob)/([^/\s]+))?(?:/(.*?))?/?$",
    )
    .expect("LOCATOR regex is invalid")
});

/// Whether a root specifier points at a GitHub repository.
pub fn is_github_locator(spec: &str) -> bool {
    LOCATOR.is_match(spec.trim())
}

/// A parsed GitHub URL: repository, optional ref, in-repo path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit. `None` means the default branch.
    pub reference: Option<String>,
    /// Path inside the repository, `""` for the root.
    pub path: String,
}

impl RepoLocator {
    /// Parse `https://github.com/<owner>/<repo>[.git][/tree|blob/<ref>][/<path>]`.
    ///
    /// Refs containing `/` cannot be told apart from paths; only the first
    /// segment after `tree/` or `blob/` is taken as the ref.
    pub fn parse(spec: &str) -> Result<Self> {
        let caps = LOCATOR
            .captures(spec.trim())
            .ok_or_else(|| PrinError::config(spec, "not a GitHub repository URL"))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        Ok(Self {
            owner: group(1).unwrap_or_default(),
            repo: group(2).unwrap_or_default(),
            reference: group(3),
            path: group(4)
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or_default(),
        })
    }

    /// `owner/repo@ref`, the identity used to share one adapter between roots.
    pub fn repo_key(&self) -> String {
        format!(
            "{}/{}@{}",
            self.owner,
            self.repo,
            self.reference.as_deref().unwrap_or("HEAD")
        )
    }

    fn same_repo(&self, other: &RepoLocator) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner)
            && self.repo.eq_ignore_ascii_case(&other.repo)
            && (other.reference.is_none() || other.reference == self.reference)
    }
}

/// Tunables for [`GitHubSource`].
#[derive(Debug, Clone)]
pub struct GitHubOptions {
    pub retry: RetryPolicy,
    /// Download files to test for semantic emptiness.
    pub empty_check: bool,
    pub api_base: String,
}

impl Default for GitHubOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            empty_check: false,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Contents {
    Listing(Vec<ContentItem>),
    Single(Box<ContentItem>),
}

#[derive(Debug, Deserialize)]
struct Blob {
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Where a file's bytes can be fetched from.
#[derive(Debug, Clone, Default)]
struct FileRef {
    inline: Option<String>,
    download_url: Option<String>,
    sha: Option<String>,
}

impl From<&ContentItem> for FileRef {
    fn from(item: &ContentItem) -> Self {
        let inline = match (&item.encoding, &item.content) {
            (Some(enc), Some(content)) if enc == "base64" && !content.is_empty() => {
                Some(content.clone())
            }
            _ => None,
        };
        Self {
            inline,
            download_url: item.download_url.clone(),
            sha: item.sha.clone(),
        }
    }
}

/// [`SourceAdapter`] over one GitHub repository at one ref.
pub struct GitHubSource {
    locator: RepoLocator,
    client: Box<dyn HttpClient>,
    options: GitHubOptions,
    default_branch: OnceLock<String>,
    files: Mutex<HashMap<String, FileRef>>,
    prefetched: Mutex<HashMap<String, Vec<u8>>>,
    retries: AtomicUsize,
}

impl GitHubSource {
    pub fn new(locator: RepoLocator, client: Box<dyn HttpClient>, options: GitHubOptions) -> Self {
        Self {
            locator,
            client,
            options,
            default_branch: OnceLock::new(),
            files: Mutex::new(HashMap::new()),
            prefetched: Mutex::new(HashMap::new()),
            retries: AtomicUsize::new(0),
        }
    }

    pub fn locator(&self) -> &RepoLocator {
        &self.locator
    }

    /// Number of rate-limit backoffs taken so far.
    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::Relaxed)
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.options.api_base.trim_end_matches('/'),
            self.locator.owner,
            self.locator.repo
        )
    }

    fn get(&self, url: &str) -> Result<super::HttpResponse> {
        get_with_retry(self.client.as_ref(), url, &self.options.retry, &self.retries)
    }

    /// The ref to read from, looking up the default branch once.
    fn reference(&self) -> Result<String> {
        if let Some(reference) = &self.locator.reference {
            return Ok(reference.clone());
        }
        if let Some(branch) = self.default_branch.get() {
            return Ok(branch.clone());
        }
        let url = self.repo_url();
        let info: RepoInfo = self.get(&url)?.json(&url)?;
        debug!(repo = %self.locator.repo_key(), branch = %info.default_branch, "resolved default branch");
        Ok(self.default_branch.get_or_init(|| info.default_branch).clone())
    }

    fn contents_url(&self, path: &str) -> Result<String> {
        let reference = self.reference()?;
        let mut url = format!("{}/contents", self.repo_url());
        if !path.is_empty() {
            url.push('/');
            url.push_str(&encode(path, true));
        }
        url.push_str("?ref=");
        url.push_str(&encode(&reference, false));
        Ok(url)
    }

    fn contents(&self, path: &str) -> Result<Contents> {
        let url = self.contents_url(path)?;
        self.get(&url)?.json(&url)
    }

    fn remember(&self, path: &str, file: FileRef) {
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.to_string(), file);
        }
    }

    fn file_ref(&self, path: &str) -> Result<FileRef> {
        if let Some(file) = self.files.lock().ok().and_then(|f| f.get(path).cloned()) {
            return Ok(file);
        }
        match self.contents(path)? {
            Contents::Single(item) if item.kind == "file" => {
                let file = FileRef::from(item.as_ref());
                self.remember(path, file.clone());
                Ok(file)
            }
            _ => Err(PrinError::NoContent(path.to_string())),
        }
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.file_ref(path)?;

        if let Some(inline) = &file.inline {
            match decode_base64(path, inline) {
                Ok(bytes) => return Ok(bytes),
                Err(e) => debug!(path, error = %e, "inline content unusable"),
            }
        }
        if let Some(url) = &file.download_url {
            match self.get(url) {
                Ok(response) => return Ok(response.body),
                Err(e) if file.sha.is_some() => {
                    debug!(path, error = %e, "download failed, trying the blob API")
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(sha) = &file.sha {
            return self.fetch_blob(path, sha);
        }
        Err(PrinError::NoContent(path.to_string()))
    }

    fn fetch_blob(&self, path: &str, sha: &str) -> Result<Vec<u8>> {
        let url = format!("{}/git/blobs/{}", self.repo_url(), sha);
        let blob: Blob = self.get(&url)?.json(&url)?;
        match (blob.encoding.as_deref(), blob.content) {
            (Some("base64"), Some(content)) => decode_base64(path, &content),
            (_, Some(content)) => Ok(content.into_bytes()),
            _ => Err(PrinError::NoContent(path.to_string())),
        }
    }
}

impl SourceAdapter for GitHubSource {
    fn origin(&self) -> String {
        format!("github.com/{}", self.locator.repo_key())
    }

    fn resolve_root(&self, spec: &str) -> Result<ResolvedRoot> {
        let path = if is_github_locator(spec) {
            let parsed = RepoLocator::parse(spec)?;
            if !self.locator.same_repo(&parsed) {
                return Err(PrinError::config(
                    spec,
                    format!("does not belong to {}", self.locator.repo_key()),
                ));
            }
            parsed.path
        } else {
            spec.trim_matches('/').to_string()
        };
        let path = if path == "." { String::new() } else { path };

        if path.is_empty() {
            // Surface a missing repository or bad ref before anything prints.
            self.contents_url("")
                .map_err(|e| PrinError::config(spec, e.to_string()))?;
            return Ok(ResolvedRoot::Directory(path));
        }

        match self.contents(&path) {
            Ok(Contents::Listing(_)) => Ok(ResolvedRoot::Directory(path)),
            Ok(Contents::Single(item)) if item.kind == "file" => {
                self.remember(&path, FileRef::from(item.as_ref()));
                Ok(ResolvedRoot::File(path))
            }
            Ok(Contents::Single(item)) => Err(PrinError::config(
                spec,
                format!("unsupported entry type '{}'", item.kind),
            )),
            Err(e) => Err(PrinError::config(spec, e.to_string())),
        }
    }

    fn list_dir(&self, dir: &str) -> Result<Vec<Entry>> {
        let items = match self.contents(dir)? {
            Contents::Listing(items) => items,
            Contents::Single(item) if item.kind == "file" => {
                self.remember(dir, FileRef::from(item.as_ref()));
                return Err(PrinError::NotADirectory(dir.to_string()));
            }
            Contents::Single(item) => {
                return Err(PrinError::Decode {
                    what: dir.to_string(),
                    reason: format!("expected a directory listing, got '{}'", item.kind),
                });
            }
        };

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            let path = item
                .path
                .clone()
                .unwrap_or_else(|| super::join_path(dir, &item.name));
            let kind = match item.kind.as_str() {
                "dir" => EntryKind::Directory,
                "file" => {
                    self.remember(&path, FileRef::from(item));
                    EntryKind::File
                }
                _ => EntryKind::Other,
            };
            let name = if item.name.is_empty() {
                base_name(&path).to_string()
            } else {
                item.name.clone()
            };
            entries.push(Entry::new(path, name, kind));
        }
        entries.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));

        debug!(repo = %self.locator.repo_key(), dir, entries = entries.len(), "listed directory");
        Ok(entries)
    }

    fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(bytes) = self.prefetched.lock().ok().and_then(|mut p| p.remove(path)) {
            return Ok(bytes);
        }
        self.fetch(path)
    }

    fn supports_empty_check(&self) -> bool {
        self.options.empty_check
    }

    fn is_empty(&self, path: &str) -> Result<bool> {
        if !self.options.empty_check {
            return Ok(false);
        }
        let bytes = self.fetch(path)?;
        if is_blob_semantically_empty(path, &bytes) {
            return Ok(true);
        }
        // Kept for the read that follows a non-empty verdict.
        if let Ok(mut prefetched) = self.prefetched.lock() {
            prefetched.insert(path.to_string(), bytes);
        }
        Ok(false)
    }

    fn release(&self, path: &str) {
        if let Ok(mut prefetched) = self.prefetched.lock() {
            prefetched.remove(path);
        }
    }
}

fn decode_base64(path: &str, content: &str) -> Result<Vec<u8>> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| PrinError::Decode {
        what: path.to_string(),
        reason: e.to_string(),
    })
}

/// Percent-encode a URL path (`keep_slash`) or query value.
fn encode(value: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::HttpResponse;
    use crate::test_utils::ScriptedHttp;
    use serde_json::json;
    use std::time::Duration;

    const API: &str = "https://api.test";

    fn options() -> GitHubOptions {
        GitHubOptions {
            retry: RetryPolicy {
                max_attempts: 5,
                max_wait: Duration::from_secs(5),
                base_delay: Duration::ZERO,
            },
            empty_check: false,
            api_base: API.to_string(),
        }
    }

    fn source(http: &ScriptedHttp, url: &str) -> GitHubSource {
        GitHubSource::new(
            RepoLocator::parse(url).unwrap(),
            Box::new(http.clone()),
            options(),
        )
    }

    fn with_default_branch(http: &ScriptedHttp) {
        http.json(
            &format!("{}/repos/octo/demo", API),
            json!({ "default_branch": "main" }),
        );
    }

    #[test]
    fn test_parse_locators() {
        let plain = RepoLocator::parse("https://github.com/octo/demo").unwrap();
        assert_eq!(plain.owner, "octo");
        assert_eq!(plain.repo, "demo");
        assert_eq!(plain.reference, None);
        assert_eq!(plain.path, "");

        let git = RepoLocator::parse("git+https://github.com/octo/demo.git").unwrap();
        assert_eq!(git.repo, "demo");

        let sub = RepoLocator::parse("https://github.com/TypingMind/awesome-typingmind/LICENSE").unwrap();
        assert_eq!(sub.repo, "awesome-typingmind");
        assert_eq!(sub.path, "LICENSE");

        let tree = RepoLocator::parse("github.com/octo/demo/tree/v1.2/src/lib/").unwrap();
        assert_eq!(tree.reference.as_deref(), Some("v1.2"));
        assert_eq!(tree.path, "src/lib");

        assert!(RepoLocator::parse("https://gitlab.com/octo/demo").is_err());
        assert!(!is_github_locator("./src"));
        assert!(is_github_locator("https://github.com/octo/demo/"));
    }

    #[test]
    fn test_list_dir_maps_kinds_and_sorts_dirs_first() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([
                { "type": "file", "name": "b.py", "path": "b.py", "sha": "s1",
                  "download_url": "https://raw.test/b.py" },
                { "type": "dir", "name": "src", "path": "src" },
                { "type": "submodule", "name": "vendored", "path": "vendored" },
                { "type": "file", "name": "a.py", "path": "a.py", "sha": "s2",
                  "download_url": "https://raw.test/a.py" }
            ]),
        );

        let gh = source(&http, "https://github.com/octo/demo");
        assert_eq!(gh.resolve_root("").unwrap(), ResolvedRoot::Directory(String::new()));
        let entries = gh.list_dir("").unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("src", EntryKind::Directory),
                ("a.py", EntryKind::File),
                ("b.py", EntryKind::File),
                ("vendored", EntryKind::Other),
            ]
        );
        // The default branch is looked up once.
        assert_eq!(http.request_count(&format!("{}/repos/octo/demo", API)), 1);
    }

    #[test]
    fn test_read_prefers_download_url_from_listing() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents/src?ref=main", API),
            json!([{ "type": "file", "name": "a.py", "path": "src/a.py", "sha": "s",
                     "download_url": "https://raw.test/src/a.py" }]),
        );
        http.on("https://raw.test/src/a.py", HttpResponse::new(200, "print(1)\n"));

        let gh = source(&http, "https://github.com/octo/demo");
        gh.list_dir("src").unwrap();
        assert_eq!(gh.read_file_bytes("src/a.py").unwrap(), b"print(1)\n");
    }

    #[test]
    fn test_file_root_uses_inline_content() {
        let http = ScriptedHttp::new();
        http.json(
            &format!("{}/repos/octo/demo/contents/LICENSE?ref=v1", API),
            json!({ "type": "file", "name": "LICENSE", "path": "LICENSE",
                    "encoding": "base64", "content": "TUlU\nIExp\nY2Vuc2U=\n" }),
        );

        let gh = source(&http, "https://github.com/octo/demo/blob/v1/LICENSE");
        let root = gh.resolve_root("https://github.com/octo/demo/blob/v1/LICENSE").unwrap();
        assert_eq!(root, ResolvedRoot::File("LICENSE".to_string()));
        assert_eq!(gh.read_file_bytes("LICENSE").unwrap(), b"MIT License");
        assert!(matches!(gh.list_dir("LICENSE"), Err(PrinError::NotADirectory(_))));
    }

    #[test]
    fn test_falls_back_to_blob_api() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([{ "type": "file", "name": "x.rs", "path": "x.rs", "sha": "abc" }]),
        );
        http.json(
            &format!("{}/repos/octo/demo/git/blobs/abc", API),
            json!({ "encoding": "base64", "content": "Zm4geCgpIHt9" }),
        );

        let gh = source(&http, "https://github.com/octo/demo");
        gh.list_dir("").unwrap();
        assert_eq!(gh.read_file_bytes("x.rs").unwrap(), b"fn x() {}");
    }

    #[test]
    fn test_failed_download_falls_back_to_blob_api() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([{ "type": "file", "name": "x.rs", "path": "x.rs", "sha": "abc",
                     "download_url": "https://raw.test/x.rs" }]),
        );
        http.on("https://raw.test/x.rs", HttpResponse::new(502, "bad gateway"));
        http.json(
            &format!("{}/repos/octo/demo/git/blobs/abc", API),
            json!({ "encoding": "base64", "content": "Zm4geCgpIHt9" }),
        );

        let gh = source(&http, "https://github.com/octo/demo");
        gh.list_dir("").unwrap();
        assert_eq!(gh.read_file_bytes("x.rs").unwrap(), b"fn x() {}");
        assert_eq!(http.request_count("https://raw.test/x.rs"), 1);
        assert_eq!(http.request_count(&format!("{}/repos/octo/demo/git/blobs/abc", API)), 1);
    }

    #[test]
    fn test_failed_download_without_sha_is_an_error() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([{ "type": "file", "name": "x.rs", "path": "x.rs",
                     "download_url": "https://raw.test/x.rs" }]),
        );
        http.on("https://raw.test/x.rs", HttpResponse::new(502, "bad gateway"));

        let gh = source(&http, "https://github.com/octo/demo");
        gh.list_dir("").unwrap();
        let err = gh.read_file_bytes("x.rs").unwrap_err();
        assert!(matches!(err, PrinError::Http { status: 502, .. }));
    }

    #[test]
    fn test_rate_limited_twice_then_success() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([{ "type": "file", "name": "a.py", "path": "a.py",
                     "download_url": "https://raw.test/a.py" }]),
        );
        let limited = HttpResponse::new(429, "").with_header("Retry-After", "0");
        http.on("https://raw.test/a.py", limited.clone());
        http.on("https://raw.test/a.py", limited);
        http.on("https://raw.test/a.py", HttpResponse::new(200, "ok\n"));

        let gh = source(&http, "https://github.com/octo/demo");
        gh.list_dir("").unwrap();
        assert_eq!(gh.read_file_bytes("a.py").unwrap(), b"ok\n");
        assert_eq!(gh.retries(), 2);
    }

    #[test]
    fn test_unknown_subpath_is_config_error() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        let gh = source(&http, "https://github.com/octo/demo");
        let err = gh.resolve_root("missing/dir").unwrap_err();
        assert!(matches!(err, PrinError::Config { .. }));
    }

    #[test]
    fn test_empty_check_reuses_downloaded_bytes() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([
                { "type": "file", "name": "__init__.py", "path": "__init__.py",
                  "download_url": "https://raw.test/__init__.py" },
                { "type": "file", "name": "core.py", "path": "core.py",
                  "download_url": "https://raw.test/core.py" }
            ]),
        );
        http.on("https://raw.test/__init__.py", HttpResponse::new(200, "\"\"\"pkg\"\"\"\n"));
        http.on("https://raw.test/core.py", HttpResponse::new(200, "run()\n"));

        let gh = GitHubSource::new(
            RepoLocator::parse("https://github.com/octo/demo").unwrap(),
            Box::new(http.clone()),
            GitHubOptions {
                empty_check: true,
                ..options()
            },
        );
        gh.list_dir("").unwrap();
        assert!(gh.supports_empty_check());

        // Suppressed files are never read, so their bytes are not kept.
        assert!(gh.is_empty("__init__.py").unwrap());
        assert!(!gh.prefetched.lock().unwrap().contains_key("__init__.py"));

        assert!(!gh.is_empty("core.py").unwrap());
        assert_eq!(gh.read_file_bytes("core.py").unwrap(), b"run()\n");
        assert_eq!(http.request_count("https://raw.test/core.py"), 1);
        assert!(gh.prefetched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_release_drops_prefetched_bytes() {
        let http = ScriptedHttp::new();
        with_default_branch(&http);
        http.json(
            &format!("{}/repos/octo/demo/contents?ref=main", API),
            json!([{ "type": "file", "name": "core.py", "path": "core.py",
                     "download_url": "https://raw.test/core.py" }]),
        );
        http.on("https://raw.test/core.py", HttpResponse::new(200, "run()\n"));

        let gh = GitHubSource::new(
            RepoLocator::parse("https://github.com/octo/demo").unwrap(),
            Box::new(http.clone()),
            GitHubOptions {
                empty_check: true,
                ..options()
            },
        );
        gh.list_dir("").unwrap();
        assert!(!gh.is_empty("core.py").unwrap());
        gh.release("core.py");
        assert!(gh.prefetched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("docs/a b.md", true), "docs/a%20b.md");
        assert_eq!(encode("feature/x", false), "feature%2Fx");
    }
}
