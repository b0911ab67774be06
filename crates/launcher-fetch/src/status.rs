//! The fetch-status signal: read by gates that need to wait for the catalogue to be populated.

use launcher_tasks::Gate;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where the (possibly-retrying) Fetch Task currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl FetchStatus {
    fn to_u8(self) -> u8 {
        match self {
            FetchStatus::NotStarted => 0,
            FetchStatus::InProgress => 1,
            FetchStatus::Completed => 2,
            FetchStatus::Cancelled => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => FetchStatus::NotStarted,
            1 => FetchStatus::InProgress,
            2 => FetchStatus::Completed,
            _ => FetchStatus::Cancelled,
        }
    }
}

/// A cheaply-cloneable, thread-safe handle to the fetch task's current status. Outlives any
/// individual attempt: a retry resubmits a fresh task instance but keeps writing to the same
/// handle, so `status_of_fetch_list_of_versions()` reflects the whole retry sequence.
#[derive(Debug, Clone)]
pub struct FetchStatusHandle(Arc<AtomicU8>);

impl Default for FetchStatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStatusHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(FetchStatus::NotStarted.to_u8())))
    }

    pub fn get(&self) -> FetchStatus {
        FetchStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, status: FetchStatus) {
        self.0.store(status.to_u8(), Ordering::SeqCst);
    }
}

/// Ready once the fetch has completed; cancels the dependent task if the fetch itself was
/// cancelled.
pub struct AfterFetchCompleted(FetchStatusHandle);

impl Gate for AfterFetchCompleted {
    fn wants_to_execute(&self) -> bool {
        self.0.get() == FetchStatus::Completed
    }

    fn wants_to_cancel(&self) -> bool {
        self.0.get() == FetchStatus::Cancelled
    }
}

pub fn after_fetch_completed(status: FetchStatusHandle) -> AfterFetchCompleted {
    AfterFetchCompleted(status)
}
