//! The Project Tracker: a re-scanned-on-startup list of known projects, with lazily-derived
//! per-project metadata.
//!
//! Grounded on `Project.cpp`: `version_name()` reads the first line of the project file,
//! `time_of_last_change()` reads the thumbnail's mtime; both cache their first successful
//! read and tolerate missing/unreadable files rather than throwing. The original caches with
//! a hand-rolled `get_value([&]{...})` helper; this uses `std::sync::OnceLock` directly, per
//! the spec's note that lazy fields should use an atomic initialization primitive rather than
//! a racy boolean guard.

use launcher_version::VersionName;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

const THUMBNAIL_FILE_NAME: &str = "thumbnail.png";

/// A single tracked project: its file path plus metadata derived lazily from disk.
pub struct Project {
    file_path: PathBuf,
    version_name: OnceLock<Option<VersionName>>,
    time_of_last_change: OnceLock<SystemTime>,
}

impl Project {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            version_name: OnceLock::new(),
            time_of_last_change: OnceLock::new(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn name(&self) -> String {
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The version that produced this project, read from the first line of the project file.
    /// `None` if the file is missing, unreadable, or its first line isn't a valid version name.
    pub fn version_name(&self) -> Option<&VersionName> {
        self.version_name
            .get_or_init(|| {
                let contents = std::fs::read_to_string(&self.file_path).ok()?;
                let first_line = contents.lines().next()?;
                let name = VersionName::parse(first_line);
                name.is_valid().then_some(name)
            })
            .as_ref()
    }

    /// The thumbnail's last-modified time, or `UNIX_EPOCH` if it's missing or unreadable.
    pub fn time_of_last_change(&self) -> SystemTime {
        *self.time_of_last_change.get_or_init(|| {
            self.thumbnail_path()
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
    }

    fn thumbnail_path(&self) -> PathBuf {
        self.file_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(THUMBNAIL_FILE_NAME)
    }
}

/// Holds the set of known projects, re-scanned from `projects_info_dir` on construction: one
/// subdirectory per tracked project, each containing a project file and a thumbnail.
pub struct ProjectTracker {
    projects: Vec<Project>,
}

impl ProjectTracker {
    /// Scans `projects_info_dir` for project subdirectories. A directory with no readable
    /// project file inside it is skipped rather than treated as an error, matching the
    /// launch pipeline's tolerance for missing/unreadable metadata.
    pub fn scan(projects_info_dir: &Path) -> Self {
        let mut projects = Vec::new();
        let Ok(entries) = std::fs::read_dir(projects_info_dir) else {
            return Self { projects };
        };
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let Some(project_file) = find_project_file(&entry.path()) else {
                continue;
            };
            projects.push(Project::new(project_file));
        }
        Self { projects }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// The project file inside a tracked-project folder: the first regular file whose extension
/// matches the application's project extension.
fn find_project_file(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir).ok()?.flatten().find_map(|entry| {
        let path = entry.path();
        (path.extension().and_then(|e| e.to_str()) == Some("coollab")).then_some(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_name_reads_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.coollab");
        std::fs::write(&file, "2.1.0\nrest of the file\n").unwrap();
        let project = Project::new(file);
        assert_eq!(project.version_name().unwrap().as_str(), "2.1.0");
    }

    #[test]
    fn version_name_is_none_for_missing_file() {
        let project = Project::new(PathBuf::from("/does/not/exist.coollab"));
        assert!(project.version_name().is_none());
    }

    #[test]
    fn time_of_last_change_is_epoch_for_missing_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.coollab");
        std::fs::write(&file, "2.1.0\n").unwrap();
        let project = Project::new(file);
        assert_eq!(project.time_of_last_change(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn scan_finds_project_file_in_each_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("MyProject");
        std::fs::create_dir(&project_dir).unwrap();
        std::fs::write(project_dir.join("MyProject.coollab"), "2.1.0\n").unwrap();
        std::fs::write(project_dir.join(THUMBNAIL_FILE_NAME), []).unwrap();

        let tracker = ProjectTracker::scan(dir.path());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.projects()[0].name(), "MyProject");
    }

    #[test]
    fn scan_of_missing_directory_yields_empty_tracker() {
        let tracker = ProjectTracker::scan(Path::new("/does/not/exist"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn scan_skips_subfolders_without_a_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Empty")).unwrap();
        let tracker = ProjectTracker::scan(dir.path());
        assert!(tracker.is_empty());
    }
}
