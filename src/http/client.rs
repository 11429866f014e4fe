use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use std::io::Write;
use std::time::Duration;

use super::retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, check_retryable};

/// Downloads dist archives, retrying transient failures.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Override the pause between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Stream `url` into the writer returned by `create_writer`.
    ///
    /// A fresh writer is requested for every attempt so a partial body from
    /// a failed attempt is overwritten. Returns the number of bytes written.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading {}", url);

        let mut attempt = 1;
        loop {
            match self.download_file_once(url, &create_writer).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.downcast_ref::<NonRetryableError>().is_some() => return Err(e),
                Err(e) if attempt >= MAX_RETRIES => {
                    return Err(e.context(format!(
                        "Download of {} failed after {} attempts",
                        url, MAX_RETRIES
                    )));
                }
                Err(e) => {
                    warn!(
                        "Download attempt {}/{} failed ({}), retrying...",
                        attempt, MAX_RETRIES, e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn download_file_once<W, F>(&self, url: &str, create_writer: &F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = response.error_for_status().map_err(check_retryable)?;

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush download")?;

        debug!("Downloaded {} bytes from {}", downloaded_bytes, url);
        Ok(downloaded_bytes)
    }
}
