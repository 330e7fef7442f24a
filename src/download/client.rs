//! HTTP client wrapper for page fetches and artifact transfers.
//!
//! This module provides the `HttpClient` struct, shared by discovery and by
//! every worker. It owns the single timeout policy and the User-Agent.

use std::path::Path;
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio_util::io::StreamReader;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{HTTP_TIMEOUT_SECS, TRANSFER_CHUNK_SIZE};
use super::error::{FetchError, TransferError};
use super::stream::{CopyError, CopyStats, copy_in_chunks};
use crate::user_agent;

/// HTTP client for archive pages and artifact downloads.
///
/// This client is designed to be created once and cloned into each worker,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.fetch_page("https://example.com/").await?;
/// let stats = client
///     .transfer("https://example.com/paper.pdf", Path::new("./out/paper.pdf"))
///     .await?;
/// println!("fetched {} chars, saved {} bytes", html.len(), stats.bytes);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    chunk_size: usize,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default 60 second timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeout(HTTP_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client whose connect and read timeouts are both `timeout_secs`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeout(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            chunk_size: TRANSFER_CHUNK_SIZE,
        }
    }

    /// Overrides the transfer buffer size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Returns the transfer buffer size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetches an HTML page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the URL is invalid, the request fails or times
    /// out, the server answers with a non-success status, or the body cannot
    /// be decoded.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::from_send(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response.text().await.map_err(|e| FetchError::body(url, e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Streams `url` into `destination`, overwriting any existing file.
    ///
    /// Missing parent directories are created. The body is copied through a
    /// fixed buffer so memory use does not grow with the artifact size.
    /// On failure the partially written file is removed best-effort.
    ///
    /// # Returns
    ///
    /// Bytes written and the number of read/write cycles it took.
    ///
    /// # Errors
    ///
    /// Returns `TransferError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - The body stream breaks off
    /// - Creating the directory or writing the file fails
    #[instrument(skip(self), fields(url = %url, path = %destination.display()))]
    pub async fn transfer(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<CopyStats, TransferError> {
        let parsed = Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::io(parent, e))?;
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| TransferError::from_send(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| TransferError::io(destination, e))?;

        let mut body =
            std::pin::pin!(StreamReader::new(response.bytes_stream().map_err(std::io::Error::other)));

        let copied = copy_in_chunks(&mut body, &mut file, self.chunk_size).await;
        let stats = match copied {
            Ok(stats) => stats,
            Err(copy_error) => {
                debug!(path = %destination.display(), "cleaning up partial file after error");
                drop(file);
                let _ = tokio::fs::remove_file(destination).await;
                return Err(match copy_error {
                    CopyError::Read(e) => TransferError::stream(url, e),
                    CopyError::Write(e) => TransferError::io(destination, e),
                });
            }
        };

        info!(
            path = %destination.display(),
            bytes = stats.bytes,
            chunks = stats.chunks,
            "artifact saved"
        );
        Ok(stats)
    }
}
