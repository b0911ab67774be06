//! The notification seam: tasks reify errors and progress as notifications rather than
//! propagating them synchronously. The windowing toolkit's actual notification widget lives
//! outside this crate; this module only owns the named interface tasks call into, plus a
//! console-based implementation for the CLI surface.

use std::sync::atomic::{AtomicU64, Ordering};

/// Severity of a notification banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// Opaque handle to a previously-sent notification, used to update or dismiss it in place
/// (e.g. the Fetch Task reusing one rate-limit banner across retries instead of stacking
/// a new one per attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

impl NotificationId {
    fn fresh() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Mints a fresh id for use by test-only `Notifier` implementations in other crates,
    /// which can't reach the private [`NotificationId::fresh`].
    pub fn fresh_for_test() -> Self {
        Self::fresh()
    }
}

/// The named interface a background task uses to surface user-visible banners, standing in
/// for the out-of-scope UI toolkit's notification widget.
pub trait Notifier: Send + Sync {
    /// Sends a new notification and returns its id.
    fn send(&self, level: Level, title: &str, content: &str) -> NotificationId;

    /// Replaces the content of an existing notification in place (so a retrying task shows
    /// one banner, not a stream of them).
    fn change(&self, id: NotificationId, level: Level, title: &str, content: &str);

    /// Dismisses a notification immediately.
    fn close(&self, id: NotificationId);
}

/// Logs notifications via `tracing` instead of rendering a widget; what a headless CLI run
/// uses in place of the windowing toolkit's banners.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, level: Level, title: &str, content: &str) -> NotificationId {
        log(level, title, content);
        NotificationId::fresh()
    }

    fn change(&self, _id: NotificationId, level: Level, title: &str, content: &str) {
        log(level, title, content);
    }

    fn close(&self, _id: NotificationId) {}
}

fn log(level: Level, title: &str, content: &str) {
    match level {
        Level::Info => tracing::info!(title, "{content}"),
        Level::Warning => tracing::warn!(title, "{content}"),
        Level::Error => tracing::error!(title, "{content}"),
    }
}

/// Discards every notification; useful in tests that only care about task state transitions.
#[derive(Debug, Default)]
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn send(&self, _level: Level, _title: &str, _content: &str) -> NotificationId {
        NotificationId::fresh()
    }

    fn change(&self, _id: NotificationId, _level: Level, _title: &str, _content: &str) {}

    fn close(&self, _id: NotificationId) {}
}
