//! Error types for launcher-install

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while downloading or extracting a version.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download failed from {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("download of {url} was cancelled")]
    Cancelled { url: String },

    #[error("failed to extract archive {archive_path}: {reason}")]
    ExtractionFailed {
        archive_path: std::path::PathBuf,
        reason: String,
    },

    #[error("no download url is known for this version")]
    NoDownloadUrl,
}

impl Error {
    pub(crate) fn download_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::DownloadFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn extraction_failed(path: impl Into<std::path::PathBuf>, reason: impl Into<String>) -> Self {
        Error::ExtractionFailed {
            archive_path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn cancelled(url: impl Into<String>) -> Self {
        Error::Cancelled { url: url.into() }
    }

    /// Whether this error is worth retrying (network blips), mirroring `vx-installer`'s
    /// `is_recoverable`. A cancellation is never recoverable: retrying it would just race the
    /// same cancel flag again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Http(_) | Error::DownloadFailed { .. })
    }

    /// Whether this error is a user-requested cancellation rather than a genuine failure.
    /// `InstallTask` reverts to `NotInstalled` for this instead of `FailedToInstall`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}
