//! Minimal HTTP layer for the GitHub adapter
//!
//! The adapter only needs `GET`. Keeping that behind [`HttpClient`] lets tests
//! script responses (rate limits included) without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{PrinError, Result};

/// A fully buffered HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| PrinError::Decode {
            what: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Whether this is a rate-limit rejection rather than a plain failure.
    pub fn is_rate_limited(&self) -> bool {
        match self.status {
            429 => true,
            403 => {
                self.header("retry-after").is_some()
                    || self.header("x-ratelimit-remaining") == Some("0")
            }
            _ => false,
        }
    }

    /// How long the server asks us to wait, from `Retry-After` or `X-RateLimit-Reset`.
    pub fn rate_limit_wait(&self) -> Option<Duration> {
        if let Some(secs) = self.header("retry-after").and_then(|v| v.trim().parse::<f64>().ok()) {
            return Duration::try_from_secs_f64(secs.max(0.0)).ok();
        }
        let reset = self
            .header("x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<f64>().ok())?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Duration::try_from_secs_f64((reset - now).max(0.0)).ok()
    }
}

/// Blocking `GET` transport.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest`'s blocking client.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Build a client sending GitHub's JSON accept header and, when given, a bearer token.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("prin/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| PrinError::config("GITHUB_TOKEN", e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PrinError::config("http client", e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let transport = |e: reqwest::Error| PrinError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(transport)?.to_vec();
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Bounds on retrying rate-limited requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total requests per URL, first attempt included.
    pub max_attempts: u32,
    /// Ceiling on the total time spent waiting for one URL.
    pub max_wait: Duration,
    /// First backoff when the server gives no hint; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            max_wait: Duration::from_secs(180),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// `GET` with bounded retry on rate limiting.
///
/// Non-rate-limit failures are returned immediately. `retries` is bumped once
/// per backoff.
pub fn get_with_retry(
    client: &dyn HttpClient,
    url: &str,
    policy: &RetryPolicy,
    retries: &AtomicUsize,
) -> Result<HttpResponse> {
    let started = Instant::now();
    let deadline = started.checked_add(policy.max_wait);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let response = client.get(url)?;
        if response.is_success() {
            return Ok(response);
        }
        if !response.is_rate_limited() {
            return Err(PrinError::Http {
                url: url.to_string(),
                status: response.status,
            });
        }

        let wait = response
            .rate_limit_wait()
            .unwrap_or_else(|| policy.backoff(attempt));
        let now = Instant::now();
        let past_deadline = match (now.checked_add(wait), deadline) {
            (Some(resume), Some(deadline)) => resume > deadline,
            (None, _) => true,
            (Some(_), None) => false,
        };
        if attempt >= policy.max_attempts || past_deadline {
            return Err(PrinError::RateLimitExceeded {
                url: url.to_string(),
                waited: now.duration_since(started),
            });
        }

        debug!(url, attempt, wait_ms = wait.as_millis() as u64, "rate limited, backing off");
        retries.fetch_add(1, Ordering::Relaxed);
        std::thread::sleep(wait);
    }
}
