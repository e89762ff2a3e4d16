use crate::error::{ProcessingError, Result};
use crate::utils::constants::{FETCH_TIMEOUT_SECS, HEAD_TIMEOUT_SECS};
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Thin wrapper over `reqwest::Client` carrying the download timeouts.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    head_timeout: Duration,
    fetch_timeout: Duration,
}

impl DownloadClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            head_timeout: Duration::from_secs(HEAD_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        })
    }

    /// True when a HEAD request answers 200. Network errors count as absent.
    pub async fn exists(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
        {
            Ok(response) => {
                debug!("HEAD {} -> {}", url, response.status());
                response.status() == StatusCode::OK
            }
            Err(e) => {
                debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }

    /// GET with the fetch timeout; non-success statuses become errors.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response)
    }

    /// GET for a large body. The timeout bounds the response headers and is
    /// re-applied to each chunk by [`DownloadClient::next_chunk`], not to the
    /// whole transfer.
    pub async fn open_stream(&self, url: &str) -> Result<Response> {
        let response = tokio::time::timeout(self.fetch_timeout, self.client.get(url).send())
            .await
            .map_err(|_| timed_out(url))??;
        Ok(response.error_for_status()?)
    }

    pub async fn next_chunk(&self, url: &str, response: &mut Response) -> Result<Option<Bytes>> {
        let chunk = tokio::time::timeout(self.fetch_timeout, response.chunk())
            .await
            .map_err(|_| timed_out(url))??;
        Ok(chunk)
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        info!("Fetching: {}", url);
        let body = self.get(url).await?.text().await?;
        let parsed = serde_json::from_str(&body)?;
        info!("✓ Successfully fetched JSON from {}", url);
        Ok(parsed)
    }
}

fn timed_out(url: &str) -> ProcessingError {
    ProcessingError::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("Timed out after {}s waiting for {}", FETCH_TIMEOUT_SECS, url),
    ))
}
