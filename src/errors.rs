//! Error types for the fetch, profile and output stages.
//!
//! Only [`ProfileError`] and [`WriteError`] can end a run. [`FetchError`] is
//! always absorbed by the retry loop and the fallback tiers.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single GET attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("access forbidden (HTTP {status}); the site is likely blocking scrapers")]
    Blocked { status: u16 },

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Map a non-success status to the matching variant.
    pub fn from_status(status: u16) -> Self {
        if status == 403 {
            Self::Blocked { status }
        } else {
            Self::Status { status }
        }
    }

    /// A 403 additionally triggers user-agent rotation before the next attempt.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Blocked { status } | Self::Status { status } => Some(*status),
            _ => None,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failure to load a site profile from disk.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure to render or persist the feed. Fatal for the run.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to serialize feed: {0}")]
    Serialize(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_distinguishes_403() {
        assert_eq!(FetchError::from_status(403), FetchError::Blocked { status: 403 });
        assert_eq!(FetchError::from_status(503), FetchError::Status { status: 503 });
        assert!(FetchError::from_status(403).is_blocked());
        assert!(!FetchError::from_status(404).is_blocked());
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(FetchError::Blocked { status: 403 }.status(), Some(403));
        assert_eq!(FetchError::Timeout.status(), None);
        assert_eq!(FetchError::Transport("reset".into()).status(), None);
    }

    #[test]
    fn test_display_messages() {
        let e = FetchError::Status { status: 500 };
        assert_eq!(e.to_string(), "unexpected HTTP status 500");
        let w = WriteError::Serialize("bad".into());
        assert_eq!(w.to_string(), "failed to serialize feed: bad");
    }
}
