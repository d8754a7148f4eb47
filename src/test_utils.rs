//! Test utilities: scratch directory trees and a scripted HTTP client.
//!
//! This module is only compiled for tests and benchmarks.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::error::Result;
use crate::source::{HttpClient, HttpResponse};

/// A temporary directory tree for testing.
///
/// The directory is automatically cleaned up when dropped.
pub struct TestTree {
    dir: TempDir,
}

impl TestTree {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a text file, creating parent directories as needed.
    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        self.add_bytes(path, content.as_bytes())
    }

    pub fn add_bytes(&self, path: &str, content: &[u8]) -> PathBuf {
        let full_path = self.dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    pub fn add_dir(&self, path: &str) -> PathBuf {
        let full_path = self.dir.path().join(path);
        fs::create_dir_all(&full_path).expect("Failed to create dir");
        full_path
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Script {
    routes: HashMap<String, VecDeque<HttpResponse>>,
    requests: Vec<String>,
}

/// Fake [`HttpClient`] answering from per-URL response queues.
///
/// Responses for a URL are served in the order they were added; the last one
/// keeps being served once the queue is down to it. Unknown URLs get a 404.
/// Clones share the same script and request log.
#[derive(Clone, Default)]
pub struct ScriptedHttp {
    script: Arc<Mutex<Script>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn on(&self, url: &str, response: HttpResponse) -> &Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a `200` JSON response for `url`.
    pub fn json(&self, url: &str, value: serde_json::Value) -> &Self {
        self.on(url, HttpResponse::new(200, value.to_string()))
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.script.lock().expect("script lock poisoned").requests.clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

impl HttpClient for ScriptedHttp {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.requests.push(url.to_string());
        let response = match script.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| HttpResponse::new(404, r#"{"message":"Not Found"}"#)))
    }
}
