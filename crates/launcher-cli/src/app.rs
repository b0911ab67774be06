//! Wires every `launcher-*` crate into one running instance. Kept as an explicit struct
//! rather than process-wide singletons (see `DESIGN.md`'s "singletons" note): `main` owns
//! one `App`, threads references through, and there is no global `version_manager()` /
//! `task_manager()` accessor anywhere in this crate.

use launcher_config::Settings;
use launcher_fetch::FetchStatusHandle;
use launcher_launch::{LaunchPipeline, Project, ProjectTracker};
use launcher_paths::LauncherPaths;
use launcher_tasks::notify::{ConsoleNotifier, Notifier};
use launcher_tasks::{EngineConfig, TaskEngine};
use launcher_version::{Intent, VersionRef, VersionRegistry};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub struct App {
    pub paths: LauncherPaths,
    pub settings: Settings,
    pub registry: VersionRegistry,
    pub engine: TaskEngine,
    pub fetch_status: FetchStatusHandle,
    pub pipeline: LaunchPipeline,
    pub notifier: Arc<dyn Notifier>,
    pub projects: ProjectTracker,
}

impl App {
    /// Scans installed versions, loads settings, and submits the startup fetch task. Mirrors
    /// `VersionManager`'s constructor, which seeds `_versions` by scanning disk and
    /// immediately submits a `Task_FetchListOfVersions`.
    pub async fn start(paths: LauncherPaths) -> anyhow::Result<Self> {
        paths.ensure_dirs()?;
        let settings = Settings::load(&paths.settings_path);
        let registry = VersionRegistry::scan_installed(&paths.installed_versions_dir)?;
        let engine = TaskEngine::new(EngineConfig::default());
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

        let (_, fetch_status) =
            launcher_fetch::submit(&engine, registry.clone(), notifier.clone(), Uuid::new_v4()).await;

        let pipeline = LaunchPipeline::new(
            registry.clone(),
            fetch_status.clone(),
            engine.clone(),
            paths.clone(),
            notifier.clone(),
        );
        let projects = ProjectTracker::scan(&paths.projects_info_dir);

        if settings.automatically_install_latest_version {
            pipeline.install_latest_only(Uuid::new_v4()).await;
        }

        Ok(Self {
            paths,
            settings,
            registry,
            engine,
            fetch_status,
            pipeline,
            notifier,
            projects,
        })
    }

    /// Delegates a CLI-arg-supplied project file to the launch pipeline, mirroring the OS
    /// file-association entry point (§6): resolves the version from the project file's first
    /// line, falling back to `Latest` if it can't be read.
    pub async fn open_project_file(&self, path: &Path) {
        let version_ref = version_ref_for_project_file(path);
        self.pipeline
            .install_ifn_and_launch(version_ref, Intent::OpenFile(path.to_path_buf()))
            .await;
    }

    /// Waits until no tasks remain pending or running. Delegates the actual polling to
    /// `TaskEngine::wait_until_idle_then` and bridges its callback back to this `async fn`
    /// through a oneshot channel, the way a `LaunchTask` already does with
    /// `request_close_if_idle` to ask for an early close after a successful spawn.
    pub async fn wait_until_idle(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.engine.wait_until_idle_then(move || {
            let _ = tx.send(());
        });
        let _ = rx.await;

        if self.engine.close_requested() {
            tracing::debug!("closing now that a launched version requested it and no tasks remain");
        }
    }

    /// Saves settings unconditionally, the way `App::on_shutdown` does in the original.
    pub fn save_settings(&self) -> anyhow::Result<()> {
        self.settings.save_on_shutdown(&self.paths.settings_path)?;
        Ok(())
    }
}

/// Resolves the version a project file was created with, falling back to `Latest` if the
/// file doesn't exist or its first line isn't a valid version name. Split out from
/// `open_project_file` so this resolution logic can be unit-tested without spinning up a
/// full `App` (which submits a live fetch task on `start`).
fn version_ref_for_project_file(path: &Path) -> VersionRef {
    Project::new(path.to_path_buf())
        .version_name()
        .cloned()
        .map(VersionRef::Exact)
        .unwrap_or(VersionRef::Latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn version_ref_for_missing_project_file_falls_back_to_latest() {
        let version_ref = version_ref_for_project_file(Path::new("/does/not/exist.coollab"));
        assert_eq!(version_ref, VersionRef::Latest);
    }

    #[test]
    fn version_ref_for_project_file_reads_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("project.coollab");
        let mut file = std::fs::File::create(&file_path).unwrap();
        writeln!(file, "1.2.3").unwrap();

        let version_ref = version_ref_for_project_file(&file_path);
        assert_eq!(
            version_ref,
            VersionRef::Exact(launcher_version::VersionName::parse("1.2.3"))
        );
    }

    #[test]
    fn start_ensures_the_user_data_directory_tree_exists() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::with_base_dir(dir.path());
        paths.ensure_dirs().unwrap();
        assert!(paths.installed_versions_dir.is_dir());
        assert!(paths.projects_info_dir.is_dir());
    }
}
