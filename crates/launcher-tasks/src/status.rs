//! Task lifecycle state and the handle used to gate other tasks on it.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Waiting,
    Ready,
    Running,
    Done,
    Cancelled,
    Failed,
}

impl TaskStatus {
    fn to_u8(self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Waiting => 1,
            TaskStatus::Ready => 2,
            TaskStatus::Running => 3,
            TaskStatus::Done => 4,
            TaskStatus::Cancelled => 5,
            TaskStatus::Failed => 6,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Pending,
            1 => TaskStatus::Waiting,
            2 => TaskStatus::Ready,
            3 => TaskStatus::Running,
            4 => TaskStatus::Done,
            5 => TaskStatus::Cancelled,
            _ => TaskStatus::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled | TaskStatus::Failed)
    }
}

#[derive(Debug)]
struct Shared {
    id: Uuid,
    owner_id: Uuid,
    status: AtomicU8,
    cancel_requested: AtomicBool,
}

/// A lightweight, cloneable reference to a submitted task's id, owner and current status.
///
/// Gates hold a `TaskHandle`, not the task itself (see [`crate::gate::Gate::after`]): they
/// only ever need the status probe, never the task's behavior.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    shared: Arc<Shared>,
}

impl TaskHandle {
    /// Constructs a standalone handle not tied to any engine submission. Used internally by
    /// `TaskEngine::submit*`, and directly by other crates' tests that exercise a `Task::execute`
    /// body without going through a full engine (see `launcher-fetch`'s task tests).
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                owner_id,
                status: AtomicU8::new(TaskStatus::Pending.to_u8()),
                cancel_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.shared.owner_id
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.shared.status.load(Ordering::SeqCst))
    }

    pub(crate) fn set_status(&self, status: TaskStatus) {
        self.shared.status.store(status.to_u8(), Ordering::SeqCst);
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Requests cancellation. Advisory only: a task already executing is not forcibly
    /// interrupted, it must observe [`TaskHandle::cancel_requested`] itself.
    pub fn request_cancel(&self) {
        self.shared.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn cancel_requested(&self) -> bool {
        self.shared.cancel_requested.load(Ordering::SeqCst)
    }

    /// Lets a task report its own failure from inside `execute`; the engine preserves this
    /// over the default "Done" outcome once `execute` returns.
    pub fn report_failed(&self) {
        self.set_status(TaskStatus::Failed);
    }
}
