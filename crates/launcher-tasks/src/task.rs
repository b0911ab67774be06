//! The `Task` trait: the unit of work the engine schedules.

use crate::status::TaskHandle;

/// A background job with lifecycle hooks the engine invokes in order.
///
/// `on_submit` runs synchronously relative to the caller of `submit` (so anything
/// user-visible, like a notification, appears immediately); `execute` and `cleanup` run on a
/// worker once the task's gate admits it.
#[async_trait::async_trait]
pub trait Task: Send + Sync {
    /// Human-readable name, used for logging and notifications.
    fn name(&self) -> String;

    /// Quick tasks are allowed to run to completion on shutdown without prompting the user.
    fn is_quick(&self) -> bool {
        false
    }

    /// Whether cancelling this task on app shutdown should first ask the user to confirm.
    /// Defaults to the opposite of [`Task::is_quick`].
    fn needs_confirmation_to_cancel_on_shutdown(&self) -> bool {
        !self.is_quick()
    }

    /// Called once, synchronously, when the task is accepted by the engine.
    async fn on_submit(&self, _handle: &TaskHandle) {}

    /// Does the actual work. `handle` exposes `cancel_requested()` for cooperative
    /// cancellation; the engine does not forcibly interrupt a running task.
    async fn execute(&self, handle: &TaskHandle);

    /// Runs after `execute` (or instead of it, if the gate cancelled the task before it ran).
    async fn cleanup(&self, _was_cancelled: bool) {}

    /// Best-effort request to stop. Most tasks rely on polling `handle.cancel_requested()`
    /// from inside `execute`; a few (like an already-launching process) have nothing to do
    /// here and leave it a no-op.
    fn cancel(&self) {}
}
