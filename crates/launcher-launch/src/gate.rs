//! Gates over an [`InstallHandle`], the seam that lets the Launch Pipeline wait on an install
//! task without depending on `launcher-install`'s concrete task type.

use launcher_tasks::{after_predicate, AfterPredicate, Gate};
use launcher_version::InstallHandle;
use std::sync::{Arc, OnceLock};

/// Ready once the wrapped install has reached any terminal state. Deliberately never reports
/// `wants_to_cancel`: whether the install succeeded or failed, the dependent Launch Task is
/// admitted and re-checks the registry itself (see `Task_LaunchVersion`'s own precondition
/// check), which is how a failed or cancelled install surfaces as "failed to install" rather
/// than silently dropping the launch.
pub struct AfterInstall(Arc<dyn InstallHandle>);

impl Gate for AfterInstall {
    fn wants_to_execute(&self) -> bool {
        self.0.is_terminal()
    }
}

pub fn after_install(handle: Arc<dyn InstallHandle>) -> AfterInstall {
    AfterInstall(handle)
}

/// Cell a [`crate::deferred_install::DeferredInstallTask`] writes its resolved install into:
/// `Some(handle)` once it found a version and submitted the real install, `Some(None)` if no
/// installable version could be resolved at all.
pub type ResolvedInstall = Arc<OnceLock<Option<Arc<dyn InstallHandle>>>>;

/// Gates on `slot` rather than on the deferred task's own handle, so waiting on the *resolved*
/// install never ties up the worker slot the deferred task itself used just to resolve a name
/// and submit the real install (see DESIGN.md on `DeferredInstallTask`). Same never-cancel
/// stance as [`AfterInstall`]: an unresolved version is let through so the dependent Launch
/// Task can report it itself.
pub fn after_resolved_install(slot: ResolvedInstall) -> AfterPredicate<impl Fn() -> bool + Send + Sync> {
    after_predicate(move || match slot.get() {
        None => false,
        Some(None) => true,
        Some(Some(handle)) => handle.is_terminal(),
    })
}
