//! `DeferredInstallTask`: install a version whose name isn't known until the release index
//! has been fetched.
//!
//! Grounded on `VersionManager::after_version_installed`'s `after_latest_version_installed`
//! closure: when neither a version nor its download url is known yet, the original submits a
//! `Task_InstallVersion` gated on the fetch, which resolves "latest" once it actually runs.
//! This generalizes that to also cover `Exact(name)` submitted before the fetch has populated
//! that name's download url, since both are "resolve once fetched, then install" in shape.
//!
//! This task only resolves a target and hands the real install off to
//! [`launcher_install::get_or_submit_install`]; it does not wait around for that install to
//! finish. Waiting is the job of the [`crate::gate::ResolvedInstall`] cell this task populates
//! and the `AfterResolvedInstall` gate built over it -- busy-waiting here instead would tie up
//! a worker-pool slot for the whole install, not just the brief resolve-and-submit step.

use crate::gate::ResolvedInstall;
use launcher_install::get_or_submit_install;
use launcher_tasks::notify::{Level, Notifier};
use launcher_tasks::{nothing, Task, TaskEngine, TaskHandle};
use launcher_version::{VersionName, VersionRegistry};
use std::path::PathBuf;
use std::sync::Arc;

/// Which version to resolve once the fetch has completed.
#[derive(Debug, Clone)]
pub enum InstallTarget {
    /// The numerically greatest version with a download url, resolved at execute time.
    Latest,
    /// A specific version name, whose download url must appear in the registry by the time
    /// this task executes (the fetch task, which this is gated on, is what populates it).
    Exact(VersionName),
}

pub struct DeferredInstallTask {
    target: InstallTarget,
    registry: VersionRegistry,
    engine: TaskEngine,
    installed_versions_dir: PathBuf,
    notifier: Arc<dyn Notifier>,
    resolved: ResolvedInstall,
}

impl DeferredInstallTask {
    pub fn new(
        target: InstallTarget,
        registry: VersionRegistry,
        engine: TaskEngine,
        installed_versions_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            target,
            registry,
            engine,
            installed_versions_dir,
            notifier,
            resolved: Arc::new(std::sync::OnceLock::new()),
        }
    }

    /// The cell this task writes its resolved install handle into once it runs. Clone it
    /// before boxing the task up to hand it to something waiting on the resolution (see
    /// `LaunchPipeline`), since the task itself is moved into the engine.
    pub fn resolved_handle(&self) -> ResolvedInstall {
        self.resolved.clone()
    }
}

#[async_trait::async_trait]
impl Task for DeferredInstallTask {
    fn name(&self) -> String {
        match &self.target {
            InstallTarget::Latest => "Installing latest version".to_string(),
            InstallTarget::Exact(name) => format!("Installing version {name}"),
        }
    }

    fn is_quick(&self) -> bool {
        // Resolving a target and submitting the real install is near-instant; the install
        // itself runs as its own, separately tracked task.
        true
    }

    async fn execute(&self, handle: &TaskHandle) {
        let version = match &self.target {
            InstallTarget::Latest => self.registry.latest_with_download_url(),
            InstallTarget::Exact(name) => self.registry.find(name).filter(|v| v.download_url.is_some()),
        };
        let Some(version) = version else {
            handle.report_failed();
            self.notifier.send(
                Level::Error,
                &self.name(),
                "No version with a download url is available",
            );
            let _ = self.resolved.set(None);
            return;
        };
        let download_url = version.download_url.clone().expect("filtered to Some above");

        // The fetch has already completed by the time this task runs (it's gated on that), so
        // the real install needs no further gating of its own here.
        let inner = get_or_submit_install(
            &self.engine,
            &self.registry,
            &version.name,
            download_url,
            &self.installed_versions_dir,
            self.notifier.clone(),
            Arc::new(nothing()),
            handle.owner_id(),
        )
        .await;

        let _ = self.resolved.set(Some(inner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launcher_tasks::notify::NoOpNotifier;
    use launcher_tasks::{EngineConfig, TaskStatus};
    use uuid::Uuid;

    #[tokio::test(flavor = "multi_thread")]
    async fn latest_with_no_download_url_anywhere_fails_fast() {
        let registry = VersionRegistry::new();
        let engine = TaskEngine::new(EngineConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let task = DeferredInstallTask::new(
            InstallTarget::Latest,
            registry,
            engine,
            dir.path().to_path_buf(),
            Arc::new(NoOpNotifier),
        );
        let handle = TaskHandle::new(Uuid::new_v4());
        task.execute(&handle).await;
        assert_eq!(handle.status(), TaskStatus::Failed);
    }
}
