//! Streaming download with cancellation polling and retry-with-backoff, generalized from
//! `vx-installer::downloader::Downloader`.

use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use backon::{ExponentialBuilder, Retryable};
use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;

pub struct Downloader {
    client: reqwest::Client,
    max_retries: usize,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("coollab-launcher")
                .build()
                .expect("static client config is valid"),
            max_retries: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    fn retry_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// Downloads `url` to `output_path`, polling `cancel_requested` per chunk so the caller
    /// can interrupt a long download cooperatively. Retries the whole attempt with backoff
    /// on a recoverable error.
    pub async fn download(
        &self,
        url: &str,
        output_path: &Path,
        cancel_requested: &(dyn Fn() -> bool + Sync),
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        (|| async { self.download_once(url, output_path, cancel_requested, progress).await })
            .retry(self.retry_strategy())
            .when(Error::is_recoverable)
            .notify(|err: &Error, dur: Duration| {
                tracing::warn!(error = %err, retry_in = ?dur, "download failed, retrying");
            })
            .await
    }

    async fn download_once(
        &self,
        url: &str,
        output_path: &Path,
        cancel_requested: &(dyn Fn() -> bool + Sync),
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::download_failed(url, format!("HTTP {}", response.status())));
        }

        let total = response.content_length();
        progress.start(&format!("Downloading {url}"), total).await;

        let mut file = std::fs::File::create(output_path)?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            if cancel_requested() {
                drop(file);
                let _ = std::fs::remove_file(output_path);
                return Err(Error::cancelled(url));
            }
            let chunk = chunk?;
            std::io::Write::write_all(&mut file, &chunk)?;
            downloaded += chunk.len() as u64;
            progress.update(downloaded).await;
        }

        std::io::Write::flush(&mut file)?;
        progress.finish("Download completed").await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoOpProgressReporter;

    #[tokio::test]
    async fn download_honors_cancellation() {
        // Largely exercised end-to-end by `InstallTask` tests; this just checks the
        // cancel-before-start path returns an error rather than hanging or panicking.
        let downloader = Downloader::new();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.bin");
        let result = downloader
            .download("http://127.0.0.1:1/unreachable", &out, &|| true, &NoOpProgressReporter)
            .await;
        assert!(result.is_err());
    }
}
