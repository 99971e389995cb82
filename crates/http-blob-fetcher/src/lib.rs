//! HTTP blob fetching
//!
//! Implements the cache's [`RemoteFetcher`] contract over [`reqwest`]: one
//! attempt per call, transport error on network failure or non-success
//! status, redirect handling left to the client's default policy.

use async_trait::async_trait;
use blob_fetch_cache::{FetchError, RemoteFetcher};
use reqwest::Client;
use tracing::{debug, warn};

/// HTTP client for fetching remote blobs.
pub struct HttpBlobFetcher {
    client: Client,
}

impl HttpBlobFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (timeouts, proxies, user agent).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpBlobFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteFetcher for HttpBlobFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "fetching blob");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "blob fetch returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(Box::new(e)))?
            .to_vec();

        debug!(url = %url, size = data.len(), "fetched blob");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every request with a canned response.
    async fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let header = format!(
                "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            let _ = stream.write_all(header.as_bytes()).await;
            let _ = stream.write_all(body).await;
        });

        format!("http://{}/image.jpg", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body_on_success() {
        let url = serve_once("HTTP/1.1 200 OK", b"jpeg bytes").await;

        let bytes = HttpBlobFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(bytes, b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_fetch_maps_non_success_status() {
        let url = serve_once("HTTP/1.1 404 Not Found", b"").await;

        let result = HttpBlobFetcher::new().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_fetch_maps_connection_failure_to_transport() {
        // Reserve a port, then close the listener so the connect fails.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/image.jpg", addr);
        let result = HttpBlobFetcher::new().fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
