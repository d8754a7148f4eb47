//! Error taxonomy shared by the engine and the source adapters

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrinError {
    // Configuration
    #[error("invalid argument '{spec}': {reason}")]
    Config { spec: String, reason: String },

    /// Control signal: the path names a single file, not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    // Reading
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("rate limit on {url} not lifted after waiting {}", human(.waited))]
    RateLimitExceeded { url: String, waited: Duration },

    #[error("could not decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("no content source available for {0}")]
    NoContent(String),

    // Output
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

impl PrinError {
    pub fn config(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// The path or URL this error occurred at, if applicable.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Config { spec, .. } => Some(spec),
            Self::NotADirectory(p) | Self::NoContent(p) => Some(p),
            Self::Io { path, .. } => Some(path),
            Self::Http { url, .. }
            | Self::Transport { url, .. }
            | Self::RateLimitExceeded { url, .. } => Some(url),
            Self::Decode { what, .. } => Some(what),
            Self::Output(_) => None,
        }
    }

    /// Whether the walk can skip the affected file and keep going.
    ///
    /// Configuration and output errors are fatal; everything that goes wrong
    /// while listing or reading a single entry is not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Output(_))
    }
}

fn human(waited: &Duration) -> String {
    humantime::format_duration(*waited).to_string()
}

pub type Result<T> = std::result::Result<T, PrinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(!PrinError::config("x", "missing").is_recoverable());
        assert!(!PrinError::Output(std::io::Error::other("pipe")).is_recoverable());
        assert!(
            PrinError::Http {
                url: "u".into(),
                status: 500
            }
            .is_recoverable()
        );
        assert!(
            PrinError::RateLimitExceeded {
                url: "u".into(),
                waited: Duration::from_secs(3)
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_rate_limit_message_uses_human_duration() {
        let err = PrinError::RateLimitExceeded {
            url: "https://api.github.com/x".into(),
            waited: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "rate limit on https://api.github.com/x not lifted after waiting 1m 30s"
        );
    }
}
