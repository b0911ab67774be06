//! Error types for launcher-version

/// Result type alias for launcher-version operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while naming, comparing or registering versions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred while scanning or removing an install directory
    #[error("I/O error on installed version {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
