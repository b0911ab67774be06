//! Predicates that condition a pending task's admission.

use crate::status::TaskHandle;
use std::time::{Duration, Instant};

/// A two-predicate object attached to a pending task.
///
/// Subsumes both "run after task T" and "run when condition C holds": every dependency in
/// this scheduler, however it arose, is expressed as a `Gate`.
pub trait Gate: Send + Sync {
    fn wants_to_execute(&self) -> bool;

    /// Whether the pending task should be cancelled outright rather than waited on further.
    /// Defaults to never: most gates just wait.
    fn wants_to_cancel(&self) -> bool {
        false
    }
}

/// Always ready; the identity element of gating.
pub struct Nothing;

impl Gate for Nothing {
    fn wants_to_execute(&self) -> bool {
        true
    }
}

/// Ready once `handle` has finished; cancels itself if `handle` was cancelled or failed,
/// since a dependency that died leaves nothing to run after.
pub struct After(TaskHandle);

impl Gate for After {
    fn wants_to_execute(&self) -> bool {
        self.0.status() == crate::status::TaskStatus::Done
    }

    fn wants_to_cancel(&self) -> bool {
        matches!(
            self.0.status(),
            crate::status::TaskStatus::Cancelled | crate::status::TaskStatus::Failed
        )
    }
}

/// Ready once any of `handles` has finished.
pub struct AfterAny(Vec<TaskHandle>);

impl Gate for AfterAny {
    fn wants_to_execute(&self) -> bool {
        self.0.iter().any(|h| h.status() == crate::status::TaskStatus::Done)
    }

    fn wants_to_cancel(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|h| h.is_terminal()) && !self.wants_to_execute()
    }
}

/// Ready once all of `handles` have finished.
pub struct AfterAll(Vec<TaskHandle>);

impl Gate for AfterAll {
    fn wants_to_execute(&self) -> bool {
        self.0.iter().all(|h| h.status() == crate::status::TaskStatus::Done)
    }

    fn wants_to_cancel(&self) -> bool {
        self.0
            .iter()
            .any(|h| matches!(h.status(), crate::status::TaskStatus::Cancelled | crate::status::TaskStatus::Failed))
    }
}

/// Ready once a caller-supplied poll returns true.
pub struct AfterPredicate<F>(F)
where
    F: Fn() -> bool + Send + Sync;

impl<F> Gate for AfterPredicate<F>
where
    F: Fn() -> bool + Send + Sync,
{
    fn wants_to_execute(&self) -> bool {
        (self.0)()
    }
}

/// Ready once a wall-clock delay has elapsed. The primitive behind `TaskEngine::submit_in`.
pub struct AfterDuration {
    ready_at: Instant,
}

impl Gate for AfterDuration {
    fn wants_to_execute(&self) -> bool {
        Instant::now() >= self.ready_at
    }
}

pub fn nothing() -> Nothing {
    Nothing
}

pub fn after(handle: TaskHandle) -> After {
    After(handle)
}

pub fn after_any(handles: Vec<TaskHandle>) -> AfterAny {
    AfterAny(handles)
}

pub fn after_all(handles: Vec<TaskHandle>) -> AfterAll {
    AfterAll(handles)
}

pub fn after_predicate<F>(predicate: F) -> AfterPredicate<F>
where
    F: Fn() -> bool + Send + Sync,
{
    AfterPredicate(predicate)
}

pub fn after_duration(delay: Duration) -> AfterDuration {
    AfterDuration {
        ready_at: Instant::now() + delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TaskStatus;
    use uuid::Uuid;

    #[test]
    fn nothing_is_always_ready() {
        assert!(nothing().wants_to_execute());
    }

    #[test]
    fn after_waits_then_fires_on_done() {
        let handle = TaskHandle::new(Uuid::new_v4());
        let gate = after(handle.clone());
        assert!(!gate.wants_to_execute());
        handle.set_status(TaskStatus::Done);
        assert!(gate.wants_to_execute());
    }

    #[test]
    fn after_cancels_when_dependency_cancelled() {
        let handle = TaskHandle::new(Uuid::new_v4());
        let gate = after(handle.clone());
        handle.set_status(TaskStatus::Cancelled);
        assert!(gate.wants_to_cancel());
        assert!(!gate.wants_to_execute());
    }

    #[test]
    fn after_any_fires_as_soon_as_one_is_done() {
        let a = TaskHandle::new(Uuid::new_v4());
        let b = TaskHandle::new(Uuid::new_v4());
        let gate = after_any(vec![a.clone(), b.clone()]);
        assert!(!gate.wants_to_execute());
        b.set_status(TaskStatus::Done);
        assert!(gate.wants_to_execute());
    }

    #[test]
    fn after_all_needs_every_handle_done() {
        let a = TaskHandle::new(Uuid::new_v4());
        let b = TaskHandle::new(Uuid::new_v4());
        let gate = after_all(vec![a.clone(), b.clone()]);
        a.set_status(TaskStatus::Done);
        assert!(!gate.wants_to_execute());
        b.set_status(TaskStatus::Done);
        assert!(gate.wants_to_execute());
    }

    #[test]
    fn after_duration_fires_once_elapsed() {
        let gate = after_duration(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(gate.wants_to_execute());
    }
}
