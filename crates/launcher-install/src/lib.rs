//! Downloads and extracts a version's release archive into the installed-versions folder.
//!
//! Knows how to fetch and unpack a single version; knows nothing about which version to
//! install or why, beyond a download url it's handed.

mod downloader;
mod error;
mod extract;
mod progress;
mod task;

pub use downloader::Downloader;
pub use error::{Error, Result};
pub use progress::{default_progress_reporter, NoOpProgressReporter, ProgressReporter};
pub use task::{InstallTask, InstallTaskHandle};

use launcher_tasks::notify::Notifier;
use launcher_tasks::{Gate, TaskEngine};
use launcher_version::{InstallHandle, VersionName, VersionRegistry};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Submits an install for `version_name`, or returns the already-in-flight task's handle if
/// the registry already has one (see [`VersionRegistry::get_or_submit_install`]). The new
/// install, if one needs submitting, is gated on `gate` -- callers that can't yet prove the
/// release index has finished fetching must pass something that waits on that (e.g.
/// `launcher_fetch::after_fetch_completed`), since a download url seen mid-fetch isn't proof
/// the index is complete.
pub async fn get_or_submit_install(
    engine: &TaskEngine,
    registry: &VersionRegistry,
    version_name: &VersionName,
    download_url: String,
    installed_versions_dir: &Path,
    notifier: Arc<dyn Notifier>,
    gate: Arc<dyn Gate>,
    owner_id: Uuid,
) -> Arc<dyn InstallHandle> {
    let install_dir = installed_versions_dir.join(version_name.as_str());
    let engine = engine.clone();
    let registry_for_task = registry.clone();
    let version_name = version_name.clone();

    // The registry's dedup table only hands out a synchronous factory closure (it must hold
    // its lock across the check-then-create), so bridge into the engine's async `submit_gated`
    // with a blocking wait, the way `vx-core::installer_adapter` calls into async setup from a
    // sync boundary.
    registry.get_or_submit_install(&version_name, move || {
        let task = Arc::new(InstallTask::new(
            registry_for_task,
            version_name,
            download_url,
            install_dir,
            notifier,
        ));
        let handle = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(engine.submit_gated(gate, task, owner_id))
        });
        Arc::new(InstallTaskHandle(handle)) as Arc<dyn InstallHandle>
    })
}
