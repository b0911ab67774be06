//! The task engine: a gated admission queue over a bounded worker pool, generalizing
//! `vx-core::async_manager::AsyncVxManager`'s semaphore-bounded `FuturesUnordered` pool into
//! a scheduler with typed dependency gates, cancellation and shutdown confirmation.
//!
//! This crate knows nothing about versions, fetching or launching: it is the cooperative
//! scheduler every other `launcher-*` crate's background work runs on.

mod engine;
mod gate;
pub mod notify;
mod status;
mod task;

pub use engine::{EngineConfig, TaskEngine, WeakTaskEngine};
pub use gate::{
    after, after_all, after_any, after_duration, after_predicate, nothing, After, AfterAll,
    AfterAny, AfterDuration, AfterPredicate, Gate, Nothing,
};
pub use notify::{Level, NoOpNotifier, NotificationId, Notifier};
pub use status::{TaskHandle, TaskStatus};
pub use task::Task;
