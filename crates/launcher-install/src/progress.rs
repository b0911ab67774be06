//! Progress reporting for a running install, generalized from `vx-installer::progress`
//! (`ProgressReporter` trait, `ConsoleProgressReporter`, `NoOpProgressReporter`).

use std::sync::Arc;

/// Progress reporting interface for a download+extract operation.
#[async_trait::async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn start(&self, message: &str, total: Option<u64>);
    async fn update(&self, position: u64);
    async fn finish(&self, message: &str);
}

/// Console-based progress reporter using `indicatif`.
#[cfg(feature = "progress")]
pub struct ConsoleProgressReporter {
    bar: std::sync::Mutex<Option<indicatif::ProgressBar>>,
}

#[cfg(feature = "progress")]
impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self {
            bar: std::sync::Mutex::new(None),
        }
    }
}

#[cfg(feature = "progress")]
#[async_trait::async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn start(&self, message: &str, total: Option<u64>) {
        let bar = match total {
            Some(total) => indicatif::ProgressBar::new(total),
            None => indicatif::ProgressBar::new_spinner(),
        };
        let style = indicatif::ProgressStyle::with_template(
            "{spinner:.green} {msg} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(message.to_string());
        *self.bar.lock().expect("lock poisoned") = Some(bar);
    }

    async fn update(&self, position: u64) {
        if let Some(bar) = self.bar.lock().expect("lock poisoned").as_ref() {
            bar.set_position(position);
        }
    }

    async fn finish(&self, message: &str) {
        if let Some(bar) = self.bar.lock().expect("lock poisoned").take() {
            bar.finish_with_message(message.to_string());
        }
    }
}

/// No-op progress reporter, used in tests and headless contexts.
#[derive(Default)]
pub struct NoOpProgressReporter;

#[async_trait::async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn start(&self, _message: &str, _total: Option<u64>) {}
    async fn update(&self, _position: u64) {}
    async fn finish(&self, _message: &str) {}
}

/// Picks the console reporter when the `progress` feature is enabled, otherwise a no-op.
pub fn default_progress_reporter() -> Arc<dyn ProgressReporter> {
    #[cfg(feature = "progress")]
    {
        Arc::new(ConsoleProgressReporter::default())
    }
    #[cfg(not(feature = "progress"))]
    {
        Arc::new(NoOpProgressReporter)
    }
}
