//! Remote retrieval contract
//!
//! The cache does not speak any network protocol itself; it delegates to a
//! [`RemoteFetcher`] collaborator. One attempt per call; retry, backoff, and
//! redirect policy belong to the implementation.

use async_trait::async_trait;
use std::fmt;

/// Transport-level failure reported by a [`RemoteFetcher`].
#[derive(Debug)]
pub enum FetchError {
    /// Connection, timeout, or protocol failure.
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// The server answered with a non-success status.
    Status(u16),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(err) => write!(f, "transport error: {}", err),
            FetchError::Status(code) => write!(f, "unexpected status {}", code),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport(err) => Some(err.as_ref()),
            FetchError::Status(_) => None,
        }
    }
}

/// Fetches the raw bytes behind a URL.
#[async_trait]
pub trait RemoteFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status(503);
        assert_eq!(format!("{}", err), "unexpected status 503");
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = FetchError::Transport(Box::new(io));
        assert!(std::error::Error::source(&err).is_some());
        assert!(format!("{}", err).contains("timed out"));
    }
}
