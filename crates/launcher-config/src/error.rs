//! Error types for launcher-config

/// Result type alias for launcher-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The settings file could not be read or written
    #[error("I/O error on settings file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file's contents couldn't be serialized to TOML
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
