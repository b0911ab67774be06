//! User-data-relative directory layout for the launcher.
//!
//! This crate has no knowledge of versions, tasks or networking: it only resolves where on
//! disk things live, generalizing `vx-paths::VxPaths`'s `new`/`with_base_dir`/`ensure_dirs`
//! shape to this launcher's own directory names.

use std::path::{Path, PathBuf};

/// Resolved filesystem layout rooted at a user-data directory:
/// `<user_data>/Installed Versions/<name>/`, `<user_data>/Projects/` and
/// `<user_data>/launcher_settings.toml`.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    /// The user-data root all the other paths are relative to.
    pub user_data_dir: PathBuf,
    /// Where installed version trees live, one subdirectory per version name.
    pub installed_versions_dir: PathBuf,
    /// Where tracked-project metadata (one subfolder per project) lives.
    pub projects_info_dir: PathBuf,
    /// Where new projects are created by default.
    pub default_projects_dir: PathBuf,
    /// Path to the persisted settings file.
    pub settings_path: PathBuf,
}

impl LauncherPaths {
    /// Resolves paths under the platform's standard user-data directory
    /// (`dirs::data_dir()/coollab-launcher`).
    pub fn new() -> Option<Self> {
        let base = dirs::data_dir()?.join("coollab-launcher");
        Some(Self::with_base_dir(base))
    }

    /// Resolves paths under a caller-chosen base directory. Used by tests and by
    /// `--user-data-dir` to run isolated instances side by side.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let user_data_dir = base_dir.into();
        Self {
            installed_versions_dir: user_data_dir.join("Installed Versions"),
            projects_info_dir: user_data_dir.join("Projects"),
            default_projects_dir: user_data_dir.join("Projects"),
            settings_path: user_data_dir.join("launcher_settings.toml"),
            user_data_dir,
        }
    }

    /// Creates every directory this layout names, if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.installed_versions_dir)?;
        std::fs::create_dir_all(&self.projects_info_dir)?;
        std::fs::create_dir_all(&self.default_projects_dir)?;
        Ok(())
    }

    /// The install directory for a specific version name.
    pub fn install_dir(&self, version_name: &str) -> PathBuf {
        self.installed_versions_dir.join(version_name)
    }

    /// The path to the version's own executable inside its install directory.
    pub fn executable_path(&self, version_name: &str) -> PathBuf {
        self.install_dir(version_name).join(executable_name())
    }
}

/// The name of the launched application's own executable, with the platform's extension.
pub fn executable_name() -> String {
    format!("Coollab{}", executable_extension())
}

/// The executable file extension for the current platform.
pub fn executable_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        ".exe"
    } else {
        ""
    }
}

/// The GitHub-release asset token identifying the current platform, e.g. `"Windows"`.
pub fn os_token() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "MacOS"
    } else {
        "Linux"
    }
}

/// Resolves a `CreateNewProjectInFolder` intent's target path: empty means the default
/// projects folder, an absolute path is used as-is, a relative one is resolved against the
/// default projects folder.
pub fn resolve_project_folder(path: &Path, default_projects_dir: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        default_projects_dir.to_path_buf()
    } else if path.is_absolute() {
        path.to_path_buf()
    } else {
        default_projects_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base_dir() {
        let paths = LauncherPaths::with_base_dir("/tmp/coollab-test");
        assert_eq!(
            paths.installed_versions_dir,
            PathBuf::from("/tmp/coollab-test/Installed Versions")
        );
        assert_eq!(paths.projects_info_dir, PathBuf::from("/tmp/coollab-test/Projects"));
        assert_eq!(
            paths.settings_path,
            PathBuf::from("/tmp/coollab-test/launcher_settings.toml")
        );
    }

    #[test]
    fn ensure_dirs_creates_the_whole_tree() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::with_base_dir(dir.path());
        paths.ensure_dirs().unwrap();
        assert!(paths.installed_versions_dir.is_dir());
        assert!(paths.projects_info_dir.is_dir());
    }

    #[test]
    fn resolve_project_folder_empty_means_default() {
        let default_dir = PathBuf::from("/home/u/Projects");
        assert_eq!(resolve_project_folder(Path::new(""), &default_dir), default_dir);
    }

    #[test]
    fn resolve_project_folder_absolute_is_kept_as_is() {
        let default_dir = PathBuf::from("/home/u/Projects");
        let abs = PathBuf::from("/elsewhere/MyProject");
        assert_eq!(resolve_project_folder(&abs, &default_dir), abs);
    }

    #[test]
    fn resolve_project_folder_relative_joins_default() {
        let default_dir = PathBuf::from("/home/u/Projects");
        let rel = PathBuf::from("MyProject");
        assert_eq!(
            resolve_project_folder(&rel, &default_dir),
            PathBuf::from("/home/u/Projects/MyProject")
        );
    }
}
