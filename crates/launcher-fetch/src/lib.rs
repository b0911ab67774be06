//! Fetches the remote release index and populates the version registry's download urls.
//!
//! Knows how to talk to the release index and how to gate other tasks on having done so;
//! knows nothing about installing or launching.

mod status;
mod task;

pub use status::{after_fetch_completed, AfterFetchCompleted, FetchStatus, FetchStatusHandle};
pub use task::FetchListOfVersionsTask;

use launcher_tasks::notify::Notifier;
use launcher_tasks::{TaskEngine, TaskHandle};
use launcher_version::VersionRegistry;
use std::sync::Arc;
use uuid::Uuid;

/// Submits the initial fetch task against `engine` and returns both the submitted task's
/// handle and the long-lived status signal other gates can poll.
pub async fn submit(
    engine: &TaskEngine,
    registry: VersionRegistry,
    notifier: Arc<dyn Notifier>,
    owner_id: Uuid,
) -> (TaskHandle, FetchStatusHandle) {
    let status = FetchStatusHandle::new();
    let task = Arc::new(FetchListOfVersionsTask::new(
        registry,
        status.clone(),
        notifier,
        engine.downgrade(),
        owner_id,
    ));
    let handle = engine.submit_owned(task, owner_id).await;
    (handle, status)
}
