//! `LaunchTask`: spawns an installed version's executable, detached from the launcher.
//!
//! Mirrors `Task_LaunchVersion.cpp`: the version must already be installed by the time
//! `execute` runs (the Launch Pipeline's gate is what guarantees that); this task only spawns
//! and reports, it never installs anything itself.

use launcher_paths::{resolve_project_folder, LauncherPaths};
use launcher_tasks::notify::{Level, Notifier};
use launcher_tasks::{Task, TaskEngine, TaskHandle};
use launcher_version::{Intent, VersionRef, VersionRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Spawns the resolved version's executable with the argument vector derived from `intent`.
///
/// Quick and non-cancellable: once admitted, spawning a process is effectively instantaneous
/// and there is nothing meaningful to cancel mid-flight, mirroring the source's
/// `is_quick_task() -> true` / `cancel() {}` / `needs_user_confirmation... -> false`.
pub struct LaunchTask {
    registry: VersionRegistry,
    version_ref: VersionRef,
    intent: Intent,
    paths: LauncherPaths,
    notifier: Arc<dyn Notifier>,
    engine: TaskEngine,
}

impl LaunchTask {
    pub fn new(
        registry: VersionRegistry,
        version_ref: VersionRef,
        intent: Intent,
        paths: LauncherPaths,
        notifier: Arc<dyn Notifier>,
        engine: TaskEngine,
    ) -> Self {
        Self {
            registry,
            version_ref,
            intent,
            paths,
            notifier,
            engine,
        }
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--projects_info_folder_for_the_launcher".to_string(),
            abs(&self.paths.projects_info_dir),
        ];
        match &self.intent {
            Intent::OpenFile(path) => {
                args.push("--open_project".to_string());
                args.push(abs(path));
            }
            Intent::CreateNewProjectInFolder(path) => {
                args.push("--create_new_project_in_folder".to_string());
                let resolved = resolve_project_folder(path, &self.paths.default_projects_dir);
                args.push(abs(&resolved));
            }
        }
        args
    }
}

fn abs(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[async_trait::async_trait]
impl Task for LaunchTask {
    fn name(&self) -> String {
        match &self.intent {
            Intent::OpenFile(path) => format!(
                "Launching \"{}\"",
                path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
            ),
            Intent::CreateNewProjectInFolder(_) => "Launching a new project".to_string(),
        }
    }

    fn is_quick(&self) -> bool {
        true
    }

    fn needs_confirmation_to_cancel_on_shutdown(&self) -> bool {
        false
    }

    async fn on_submit(&self, _handle: &TaskHandle) {
        self.notifier.send(
            Level::Info,
            &self.name(),
            &format!("Waiting for {} to install", self.version_ref),
        );
    }

    async fn execute(&self, handle: &TaskHandle) {
        let version = self.registry.find_installed(&self.version_ref);
        let Some(version) = version.filter(|v| v.is_installed()) else {
            handle.report_failed();
            self.notifier.send(
                Level::Error,
                &self.name(),
                &format!("Can't launch because we failed to install {}", self.version_ref),
            );
            return;
        };

        let executable = self.paths.executable_path(version.name.as_str());
        let args = self.build_args();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        match spawn_detached(&executable, &arg_refs) {
            Ok(()) => {
                self.engine.request_close_if_idle();
            }
            Err(error) => {
                tracing::warn!(version = %version.name, %error, "launch: spawn failed");
                handle.report_failed();
                self.notifier.send(
                    Level::Error,
                    &self.name(),
                    &format!("{} is corrupted. You should uninstall and reinstall it.", self.version_ref),
                );
            }
        }
    }

    async fn cleanup(&self, _was_cancelled: bool) {}
}

/// Spawns `executable` with `args`, detached from the launcher's own process group so the
/// launcher can exit without killing the application it just started.
fn spawn_detached(executable: &Path, args: &[&str]) -> std::io::Result<()> {
    let mut cmd = std::process::Command::new(executable);
    cmd.args(args);
    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::null());
    cmd.stderr(std::process::Stdio::null());
    cmd.spawn()?;
    Ok(())
}
