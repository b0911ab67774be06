//! The Launch Pipeline: translates a `(VersionRef, Intent)` pair into a scheduled chain of
//! fetch -> install-if-needed -> launch, gated the way `VersionManager::after_version_installed`
//! /`install_ifn_and_launch` compose them in the original.

use crate::deferred_install::{DeferredInstallTask, InstallTarget};
use crate::gate::{after_install, after_resolved_install};
use crate::task::LaunchTask;
use launcher_fetch::FetchStatusHandle;
use launcher_install::get_or_submit_install;
use launcher_paths::LauncherPaths;
use launcher_tasks::notify::Notifier;
use launcher_tasks::{nothing, Gate, TaskEngine, TaskHandle};
use launcher_version::{Intent, VersionRef, VersionRegistry};
use std::sync::Arc;
use uuid::Uuid;

/// Composes the fetch/install/launch chain. Holds references to every collaborator the
/// pipeline needs to resolve a [`VersionRef`] into an installed version and spawn it.
#[derive(Clone)]
pub struct LaunchPipeline {
    registry: VersionRegistry,
    fetch_status: FetchStatusHandle,
    engine: TaskEngine,
    paths: LauncherPaths,
    notifier: Arc<dyn Notifier>,
}

impl LaunchPipeline {
    pub fn new(
        registry: VersionRegistry,
        fetch_status: FetchStatusHandle,
        engine: TaskEngine,
        paths: LauncherPaths,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            fetch_status,
            engine,
            paths,
            notifier,
        }
    }

    /// Submits a Launch Task for `version_ref`/`intent`, gated on whatever install work (if
    /// any) is needed first. Returns the Launch Task's handle.
    pub async fn install_ifn_and_launch(&self, version_ref: VersionRef, intent: Intent) -> TaskHandle {
        let owner_id = Uuid::new_v4();
        let gate = self.gate_for(&version_ref, owner_id).await;
        let task = Arc::new(LaunchTask::new(
            self.registry.clone(),
            version_ref,
            intent,
            self.paths.clone(),
            self.notifier.clone(),
            self.engine.clone(),
        ));
        self.engine.submit_gated(gate, task, owner_id).await
    }

    /// Submits only the install side, with no trailing Launch Task: used when
    /// `automatically_install_latest_version` toggles on (§2.2), which should pre-fetch the
    /// latest non-experimental build without launching it.
    pub async fn install_latest_only(&self, owner_id: Uuid) -> TaskHandle {
        let gate = self.after_latest_version_installed(owner_id).await;
        // The "task" here is nothing but a marker: the real work already happened inside
        // `gate`'s construction (it submitted the install). We still hand back a handle that
        // completes once that install does, by gating a no-op quick task on it.
        let task = Arc::new(NoopTask);
        self.engine.submit_gated(gate, task, owner_id).await
    }

    async fn gate_for(&self, version_ref: &VersionRef, owner_id: Uuid) -> Arc<dyn Gate> {
        match version_ref {
            VersionRef::Latest => self.after_latest_version_installed(owner_id).await,
            VersionRef::LatestInstalled => {
                if self.registry.any_installed() {
                    Arc::new(nothing())
                } else if let Some(installing) = self.registry.latest_installing() {
                    Arc::new(after_install(installing))
                } else {
                    self.after_latest_version_installed(owner_id).await
                }
            }
            VersionRef::Exact(name) => {
                if self.registry.find(name).is_some_and(|v| v.is_installed()) {
                    return Arc::new(nothing());
                }
                match self.registry.find(name).and_then(|v| v.download_url) {
                    Some(url) => {
                        // A download url can appear before the fetch as a whole has finished
                        // (releases populate incrementally), so this still needs to wait on
                        // fetch completion rather than submitting straight away.
                        let fetch_gate = Arc::new(launcher_fetch::after_fetch_completed(self.fetch_status.clone()));
                        let handle = get_or_submit_install(
                            &self.engine,
                            &self.registry,
                            name,
                            url,
                            &self.paths.installed_versions_dir,
                            self.notifier.clone(),
                            fetch_gate,
                            owner_id,
                        )
                        .await;
                        Arc::new(after_install(handle))
                    }
                    None => {
                        let task = DeferredInstallTask::new(
                            InstallTarget::Exact(name.clone()),
                            self.registry.clone(),
                            self.engine.clone(),
                            self.paths.installed_versions_dir.clone(),
                            self.notifier.clone(),
                        );
                        let resolved = task.resolved_handle();
                        let gate = Arc::new(launcher_fetch::after_fetch_completed(self.fetch_status.clone()));
                        self.engine.submit_gated(gate, Arc::new(task), owner_id).await;
                        Arc::new(after_resolved_install(resolved))
                    }
                }
            }
        }
    }

    /// The `Latest` strategy: if the fetch has finished, resolve and install-if-needed
    /// directly; if not but something is already installed, use it without waiting; otherwise
    /// defer resolution to a task gated on the fetch completing.
    async fn after_latest_version_installed(&self, owner_id: Uuid) -> Arc<dyn Gate> {
        if self.fetch_status.get() == launcher_fetch::FetchStatus::Completed {
            match self.registry.latest_with_download_url() {
                Some(version) => {
                    // The fetch is already confirmed complete here, so the install needs no
                    // further gating of its own.
                    let handle = get_or_submit_install(
                        &self.engine,
                        &self.registry,
                        &version.name,
                        version.download_url.clone().expect("latest_with_download_url guarantees Some"),
                        &self.paths.installed_versions_dir,
                        self.notifier.clone(),
                        Arc::new(nothing()),
                        owner_id,
                    )
                    .await;
                    Arc::new(after_install(handle))
                }
                None => Arc::new(nothing()),
            }
        } else if self.registry.any_installed() {
            Arc::new(nothing())
        } else {
            let task = DeferredInstallTask::new(
                InstallTarget::Latest,
                self.registry.clone(),
                self.engine.clone(),
                self.paths.installed_versions_dir.clone(),
                self.notifier.clone(),
            );
            let resolved = task.resolved_handle();
            let gate = Arc::new(launcher_fetch::after_fetch_completed(self.fetch_status.clone()));
            self.engine.submit_gated(gate, Arc::new(task), owner_id).await;
            Arc::new(after_resolved_install(resolved))
        }
    }
}

/// A task with nothing of its own to do; used to give [`LaunchPipeline::install_latest_only`]
/// a handle to hand back without duplicating the install work its gate already triggered.
struct NoopTask;

#[async_trait::async_trait]
impl launcher_tasks::Task for NoopTask {
    fn name(&self) -> String {
        "Install latest version".to_string()
    }

    fn is_quick(&self) -> bool {
        true
    }

    async fn execute(&self, _handle: &TaskHandle) {}
}
