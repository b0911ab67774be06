//! The task engine: a gated admission queue over a semaphore-bounded worker pool.

use crate::gate::{self, Gate};
use crate::status::{TaskHandle, TaskStatus};
use crate::task::Task;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// Tuning knobs for a [`TaskEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of tasks executing concurrently.
    pub max_concurrent_tasks: usize,
    /// How often the admission loop re-polls pending gates.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            poll_interval: Duration::from_millis(20),
        }
    }
}

#[derive(Clone)]
struct TrackedTask {
    handle: TaskHandle,
    task: Arc<dyn Task>,
}

struct PendingEntry {
    handle: TaskHandle,
    gate: Arc<dyn Gate>,
    task: Arc<dyn Task>,
}

struct Inner {
    tasks: Mutex<HashMap<Uuid, TrackedTask>>,
    pending: Mutex<Vec<PendingEntry>>,
    semaphore: Arc<Semaphore>,
    running: AtomicUsize,
    shutdown_requested: AtomicBool,
    close_requested: AtomicBool,
    poll_interval: Duration,
}

impl Inner {
    fn is_idle(&self) -> bool {
        self.running.load(Ordering::SeqCst) == 0
            && self.pending.lock().expect("pending lock poisoned").is_empty()
            && self.tasks.lock().expect("tasks lock poisoned").is_empty()
    }
}

/// A cooperative scheduler: tasks wait on [`Gate`]s, run on a bounded worker pool once
/// admitted, and can be mass-cancelled by owner id.
#[derive(Clone)]
pub struct TaskEngine {
    inner: Arc<Inner>,
}

impl TaskEngine {
    pub fn new(config: EngineConfig) -> Self {
        let inner = Arc::new(Inner {
            tasks: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_tasks.max(1))),
            running: AtomicUsize::new(0),
            shutdown_requested: AtomicBool::new(false),
            close_requested: AtomicBool::new(false),
            poll_interval: config.poll_interval,
        });
        spawn_admission_loop(inner.clone());
        Self { inner }
    }

    /// A non-owning reference a task can hold to resubmit itself (e.g. a fetch task's
    /// retry-with-delay), without the task owning the engine it runs on.
    pub fn downgrade(&self) -> WeakTaskEngine {
        WeakTaskEngine {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Submits a task that's ready to run as soon as a worker is free.
    pub async fn submit(&self, task: Arc<dyn Task>) -> TaskHandle {
        self.submit_gated(Arc::new(gate::nothing()), task, Uuid::new_v4()).await
    }

    /// Submits a task sharing `owner_id` with others, so they can later be cancelled together
    /// via [`TaskEngine::cancel_all`].
    pub async fn submit_owned(&self, task: Arc<dyn Task>, owner_id: Uuid) -> TaskHandle {
        self.submit_gated(Arc::new(gate::nothing()), task, owner_id).await
    }

    /// Submits a task that only becomes eligible once `gate` admits it.
    pub async fn submit_gated(&self, gate: Arc<dyn Gate>, task: Arc<dyn Task>, owner_id: Uuid) -> TaskHandle {
        let handle = TaskHandle::new(owner_id);
        if self.inner.shutdown_requested.load(Ordering::SeqCst) {
            tracing::warn!(task = %task.name(), "rejecting submission: engine is shutting down");
            handle.set_status(TaskStatus::Cancelled);
            return handle;
        }
        task.on_submit(&handle).await;
        self.inner
            .tasks
            .lock()
            .expect("tasks lock poisoned")
            .insert(handle.id(), TrackedTask { handle: handle.clone(), task: task.clone() });
        self.inner
            .pending
            .lock()
            .expect("pending lock poisoned")
            .push(PendingEntry { handle: handle.clone(), gate, task });
        handle
    }

    /// Submits a task that becomes eligible after `delay` has elapsed.
    pub async fn submit_in(&self, delay: Duration, task: Arc<dyn Task>, owner_id: Uuid) -> TaskHandle {
        self.submit_gated(Arc::new(gate::after_duration(delay)), task, owner_id).await
    }

    /// Requests cancellation of every task (pending or running) sharing `owner_id`.
    pub fn cancel_all(&self, owner_id: Uuid) {
        let tasks = self.inner.tasks.lock().expect("tasks lock poisoned");
        for tracked in tasks.values() {
            if tracked.handle.owner_id() == owner_id {
                tracked.handle.request_cancel();
                tracked.task.cancel();
            }
        }
    }

    /// Marks that the caller would like the application to close once no tasks remain.
    pub fn request_close_if_idle(&self) {
        self.inner.close_requested.store(true, Ordering::SeqCst);
    }

    pub fn close_requested(&self) -> bool {
        self.inner.close_requested.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// Invokes `callback` once the engine has no pending or running tasks left, without
    /// blocking the calling task. Used by the launch task to request a shutdown check after a
    /// successful spawn.
    pub fn wait_until_idle_then(&self, callback: impl FnOnce() + Send + 'static) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            loop {
                if inner.is_idle() {
                    callback();
                    return;
                }
                tokio::time::sleep(inner.poll_interval).await;
            }
        });
    }

    /// Stops accepting new submissions and waits for every task to reach a terminal state.
    /// Tasks that require confirmation are offered to `confirm` (by name) before being
    /// cancelled; quick tasks are always allowed to run to completion.
    pub async fn shutdown(&self, mut confirm: impl FnMut(&str) -> bool) {
        self.inner.shutdown_requested.store(true, Ordering::SeqCst);
        let mut asked: std::collections::HashSet<Uuid> = std::collections::HashSet::new();
        loop {
            let snapshot: Vec<TrackedTask> = {
                self.inner
                    .tasks
                    .lock()
                    .expect("tasks lock poisoned")
                    .values()
                    .cloned()
                    .collect()
            };
            if snapshot.is_empty() {
                break;
            }
            for tracked in &snapshot {
                if tracked.handle.is_terminal() || tracked.task.is_quick() || tracked.handle.cancel_requested() {
                    continue;
                }
                if tracked.task.needs_confirmation_to_cancel_on_shutdown() {
                    if asked.insert(tracked.handle.id()) && confirm(&tracked.task.name()) {
                        tracked.handle.request_cancel();
                        tracked.task.cancel();
                    }
                } else {
                    tracked.handle.request_cancel();
                    tracked.task.cancel();
                }
            }
            tokio::time::sleep(self.inner.poll_interval).await;
        }
    }
}

/// A non-owning handle to a [`TaskEngine`]. Upgrades to a full handle only while the engine
/// is still alive; a task holding this cannot keep the engine running past its own shutdown.
#[derive(Clone)]
pub struct WeakTaskEngine {
    inner: Weak<Inner>,
}

impl WeakTaskEngine {
    pub fn upgrade(&self) -> Option<TaskEngine> {
        self.inner.upgrade().map(|inner| TaskEngine { inner })
    }
}

fn spawn_admission_loop(inner: Arc<Inner>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(inner.poll_interval).await;

            let mut ready = Vec::new();
            {
                let mut pending = inner.pending.lock().expect("pending lock poisoned");
                let mut remaining = Vec::with_capacity(pending.len());
                for entry in pending.drain(..) {
                    if entry.handle.cancel_requested() || entry.gate.wants_to_cancel() {
                        let task = entry.task.clone();
                        let handle = entry.handle.clone();
                        let inner_for_cleanup = inner.clone();
                        tokio::spawn(async move {
                            task.cleanup(true).await;
                            handle.set_status(TaskStatus::Cancelled);
                            inner_for_cleanup
                                .tasks
                                .lock()
                                .expect("tasks lock poisoned")
                                .remove(&handle.id());
                        });
                        continue;
                    }
                    if entry.gate.wants_to_execute() {
                        entry.handle.set_status(TaskStatus::Ready);
                        ready.push(entry);
                    } else {
                        entry.handle.set_status(TaskStatus::Waiting);
                        remaining.push(entry);
                    }
                }
                *pending = remaining;
            }

            for entry in ready {
                spawn_worker(inner.clone(), entry);
            }

            if inner.shutdown_requested.load(Ordering::SeqCst) && inner.is_idle() {
                break;
            }
        }
    });
}

fn spawn_worker(inner: Arc<Inner>, entry: PendingEntry) {
    let semaphore = inner.semaphore.clone();
    tokio::spawn(async move {
        let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
        entry.handle.set_status(TaskStatus::Running);
        inner.running.fetch_add(1, Ordering::SeqCst);

        entry.task.execute(&entry.handle).await;

        let was_cancelled = entry.handle.cancel_requested();
        let final_status = if was_cancelled {
            TaskStatus::Cancelled
        } else if entry.handle.status() == TaskStatus::Failed {
            TaskStatus::Failed
        } else {
            TaskStatus::Done
        };
        entry.task.cleanup(matches!(final_status, TaskStatus::Cancelled)).await;
        entry.handle.set_status(final_status);

        inner.running.fetch_sub(1, Ordering::SeqCst);
        inner.tasks.lock().expect("tasks lock poisoned").remove(&entry.handle.id());
    });
}
