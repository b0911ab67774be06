//! Persisted user settings, loaded at startup and saved unconditionally on clean shutdown.
//!
//! Generalizes `vx-config`'s "load, fall back to default on parse failure, save on change"
//! shape down to this launcher's flat, three-field settings file; there is no project-type
//! detection or multi-source layering here, just one TOML file under the user data dir.
//! Kept as an explicit value threaded through the application rather than a process-wide
//! singleton.

mod error;

pub use error::{Error, Result};

use std::path::Path;

/// The launcher's user-togglable settings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub automatically_install_latest_version: bool,
    pub automatically_upgrade_projects_to_latest_compatible_version: bool,
    pub show_experimental_versions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            automatically_install_latest_version: false,
            automatically_upgrade_projects_to_latest_compatible_version: false,
            show_experimental_versions: false,
        }
    }
}

impl Settings {
    /// Loads settings from `path`. A missing file yields defaults silently (first run); a
    /// present-but-corrupt file logs a warning and falls back to defaults rather than
    /// erroring.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings file, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings file is corrupt, using defaults");
                Self::default()
            }
        }
    }

    /// Writes settings to `path` as TOML, creating parent directories if needed. Called
    /// unconditionally on clean shutdown (`save_on_shutdown`), not only when a value changed,
    /// so that a returning user doesn't silently inherit stale defaults for settings fields
    /// added by a future version.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Same as [`Settings::save`], named for the shutdown call site that saves regardless of
    /// whether anything changed.
    pub fn save_on_shutdown(&self, path: &Path) -> Result<()> {
        self.save(path)
    }
}
