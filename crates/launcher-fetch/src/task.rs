//! `FetchListOfVersionsTask`: pulls the release index and populates the registry.
//!
//! Each release in the index is parsed independently, so one malformed entry can't abort
//! the whole scan; matching continues past it and logs a warning instead.

use crate::status::{FetchStatus, FetchStatusHandle};
use launcher_tasks::notify::{Level, NotificationId, Notifier};
use launcher_tasks::{Task, TaskHandle, WeakTaskEngine};
use launcher_version::{VersionName, VersionRegistry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

const RELEASE_INDEX_URL: &str = "https://api.github.com/repos/CoolLibs/Lab/releases";
const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Pulls the release index once; on recoverable failure, resubmits a fresh instance of
/// itself rather than looping in place, using a weak engine handle so the task never owns
/// the engine it runs on.
pub struct FetchListOfVersionsTask {
    registry: VersionRegistry,
    status: FetchStatusHandle,
    notifier: Arc<dyn Notifier>,
    engine: WeakTaskEngine,
    owner_id: Uuid,
    client: reqwest::Client,
    release_index_url: String,
    warning_notification_id: Mutex<Option<NotificationId>>,
}

impl FetchListOfVersionsTask {
    pub fn new(
        registry: VersionRegistry,
        status: FetchStatusHandle,
        notifier: Arc<dyn Notifier>,
        engine: WeakTaskEngine,
        owner_id: Uuid,
    ) -> Self {
        Self::with_prior_notification(registry, status, notifier, engine, owner_id, None)
    }

    /// Used by retries to reuse the same notification banner across attempts instead of
    /// stacking a new one each time.
    fn with_prior_notification(
        registry: VersionRegistry,
        status: FetchStatusHandle,
        notifier: Arc<dyn Notifier>,
        engine: WeakTaskEngine,
        owner_id: Uuid,
        prior_notification_id: Option<NotificationId>,
    ) -> Self {
        Self {
            registry,
            status,
            notifier,
            engine,
            owner_id,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(99_999 * 3600))
                .build()
                .expect("reqwest client config is static and valid"),
            release_index_url: RELEASE_INDEX_URL.to_string(),
            warning_notification_id: Mutex::new(prior_notification_id),
        }
    }

    /// Points this task at a different release-index URL. Used by tests to exercise error
    /// handling against a local server instead of the real GitHub API.
    #[cfg(test)]
    pub fn with_release_index_url(mut self, url: impl Into<String>) -> Self {
        self.release_index_url = url.into();
        self
    }

    fn resubmit_self_in(&self, delay: Duration) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let retry = Arc::new(Self::with_prior_notification(
            self.registry.clone(),
            self.status.clone(),
            self.notifier.clone(),
            self.engine.clone(),
            self.owner_id,
            *self.warning_notification_id.lock().expect("lock poisoned"),
        ));
        let owner_id = self.owner_id;
        tokio::spawn(async move {
            engine.submit_in(delay, retry, owner_id).await;
        });
    }

    fn show_or_update_warning(&self, content: String) {
        let mut guard = self.warning_notification_id.lock().expect("lock poisoned");
        match *guard {
            Some(id) => self.notifier.change(id, Level::Warning, "Failed to check for new versions online", &content),
            None => {
                let id = self.notifier.send(Level::Warning, "Failed to check for new versions online", &content);
                *guard = Some(id);
            }
        }
    }

    async fn handle_transport_error(&self, error: &reqwest::Error) {
        self.show_or_update_warning("No Internet connection".to_string());
        tracing::warn!(error = %error, "fetch list of versions: transport error, will retry");
        self.resubmit_self_in(Duration::from_secs(1));
    }

    async fn handle_rate_limited(&self, response: reqwest::Response) {
        let reset_epoch = response
            .headers()
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());

        match reset_epoch {
            Some(reset_epoch) => {
                let wait = remaining_wait(reset_epoch, now_epoch_secs());
                self.show_or_update_warning(format!(
                    "You need to wait {}\nYou opened the launcher too many times in the last hour, which is the maximum number of requests we can make to our online service to check for available versions",
                    format_duration(wait)
                ));
                self.resubmit_self_in(wait);
            }
            None => {
                self.show_or_update_warning("Oops, our online versions provider is unavailable".to_string());
            }
        }
    }

    async fn handle_other_http_error(&self, status: reqwest::StatusCode) {
        self.show_or_update_warning(format!("Oops, our online versions provider is unavailable (status {status})"));
        tracing::warn!(%status, "fetch list of versions: permanent HTTP error, not retrying");
    }

    fn dismiss_warning(&self) {
        let mut guard = self.warning_notification_id.lock().expect("lock poisoned");
        if let Some(id) = guard.take() {
            self.notifier.close(id);
        }
    }
}

fn now_epoch_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// How long to wait before retrying, given the `X-RateLimit-Reset` epoch and the current
/// epoch. Saturates at zero if the reset is already in the past.
fn remaining_wait(reset_epoch: i64, now_epoch: i64) -> Duration {
    Duration::from_secs((reset_epoch - now_epoch).max(0) as u64)
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

#[derive(serde::Deserialize)]
struct Release {
    name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(serde::Deserialize)]
struct Asset {
    browser_download_url: String,
}

#[async_trait::async_trait]
impl Task for FetchListOfVersionsTask {
    fn name(&self) -> String {
        "Fetching list of versions".to_string()
    }

    fn is_quick(&self) -> bool {
        true
    }

    async fn execute(&self, handle: &TaskHandle) {
        self.status.set(FetchStatus::InProgress);

        let response = match self.client.get(&self.release_index_url).send().await {
            Ok(response) => response,
            Err(error) => {
                self.handle_transport_error(&error).await;
                return;
            }
        };

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            self.handle_rate_limited(response).await;
            return;
        }
        if !response.status().is_success() {
            self.handle_other_http_error(response.status()).await;
            return;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                self.handle_transport_error(&error).await;
                return;
            }
        };

        let releases: Vec<serde_json::Value> = match serde_json::from_str(&body) {
            Ok(releases) => releases,
            Err(error) => {
                tracing::warn!(error = %error, "fetch list of versions: response wasn't a JSON array, not retrying");
                self.show_or_update_warning("Oops, our online versions provider is unavailable".to_string());
                return;
            }
        };

        for value in releases {
            if handle.cancel_requested() {
                self.status.set(FetchStatus::Cancelled);
                return;
            }
            let release: Release = match serde_json::from_value(value) {
                Ok(release) => release,
                Err(error) => {
                    tracing::warn!(error = %error, "skipping malformed release entry");
                    continue;
                }
            };
            let Some(asset) = release
                .assets
                .iter()
                .find(|asset| asset.browser_download_url.contains(&format!("{}.zip", launcher_paths::os_token())))
            else {
                continue;
            };
            let version_name = VersionName::parse(release.name);
            if !version_name.is_valid() {
                continue;
            }
            self.registry.set_download_url(&version_name, asset.browser_download_url.clone());
        }

        self.dismiss_warning();
        self.status.set(FetchStatus::Completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launcher_tasks::notify::{Level, NoOpNotifier, NotificationId, Notifier};
    use launcher_tasks::{EngineConfig, TaskEngine};
    use std::sync::atomic::AtomicUsize;

    fn new_task(registry: VersionRegistry, status: FetchStatusHandle, url: &str) -> (FetchListOfVersionsTask, TaskEngine) {
        let engine = TaskEngine::new(EngineConfig::default());
        let task = FetchListOfVersionsTask::new(
            registry,
            status,
            Arc::new(NoOpNotifier),
            engine.downgrade(),
            Uuid::new_v4(),
        )
        .with_release_index_url(url);
        (task, engine)
    }

    /// Records every notification sent or updated, so a test can assert on the exact wait
    /// text a rate-limit banner shows without standing up a real UI toolkit.
    #[derive(Default)]
    struct SpyNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl SpyNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().expect("lock poisoned").clone()
        }
    }

    impl Notifier for SpyNotifier {
        fn send(&self, _level: Level, _title: &str, content: &str) -> NotificationId {
            self.messages.lock().expect("lock poisoned").push(content.to_string());
            NotificationId::fresh_for_test()
        }

        fn change(&self, _id: NotificationId, _level: Level, _title: &str, content: &str) {
            self.messages.lock().expect("lock poisoned").push(content.to_string());
        }

        fn close(&self, _id: NotificationId) {}
    }

    /// A one-shot-per-connection HTTP server: each accepted connection is handed the next
    /// response in `responses`, in order. Used to drive a rate-limited response followed by
    /// a successful one, the same single-thread-blocks-on-sockets technique
    /// `launcher-install`'s `spawn_slow_http_server` uses.
    fn spawn_sequenced_http_server(responses: Vec<String>) -> (std::net::SocketAddr, Arc<AtomicUsize>) {
        use std::io::Write;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_for_server = request_count.clone();

        std::thread::spawn(move || {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept() else {
                    return;
                };
                request_count_for_server.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(response.as_bytes());
            }
        });

        (addr, request_count)
    }

    fn rate_limited_response(reset_epoch: i64) -> String {
        let body = "rate limited";
        format!(
            "HTTP/1.1 403 Forbidden\r\n{RATE_LIMIT_RESET_HEADER}: {reset_epoch}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn empty_releases_response() -> String {
        let body = "[]";
        format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}", body.len())
    }

    #[tokio::test]
    async fn unreachable_host_is_treated_as_transient_and_retried() {
        let registry = VersionRegistry::new();
        let status = FetchStatusHandle::new();
        // Port 1 is reserved and nothing listens there, so the connection fails immediately.
        let (task, _engine) = new_task(registry, status.clone(), "http://127.0.0.1:1/unreachable");
        let handle = TaskHandle::new(Uuid::new_v4());
        task.execute(&handle).await;
        assert_eq!(status.get(), FetchStatus::InProgress);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_without_aborting_the_scan() {
        let registry = VersionRegistry::new();
        let release: Release = serde_json::from_value(serde_json::json!({
            "name": "not valid json structure",
        }))
        .unwrap();
        assert_eq!(release.name, "not valid json structure");
        assert!(release.assets.is_empty());
    }

    #[test]
    fn format_duration_omits_minutes_when_zero() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn remaining_wait_computes_the_epoch_difference() {
        assert_eq!(remaining_wait(1_000, 995), Duration::from_secs(5));
        assert_eq!(remaining_wait(1_000, 1_000), Duration::from_secs(0));
    }

    #[test]
    fn remaining_wait_saturates_at_zero_for_a_reset_already_in_the_past() {
        assert_eq!(remaining_wait(1_000, 1_500), Duration::from_secs(0));
    }

    #[tokio::test]
    async fn rate_limited_response_shows_the_computed_wait_and_retries_exactly_once() {
        let reset_in = 2i64;
        let reset_epoch = now_epoch_secs() + reset_in;
        let (addr, request_count) = spawn_sequenced_http_server(vec![
            rate_limited_response(reset_epoch),
            empty_releases_response(),
        ]);

        let registry = VersionRegistry::new();
        let status = FetchStatusHandle::new();
        let notifier = Arc::new(SpyNotifier::default());
        let engine = TaskEngine::new(EngineConfig::default());
        let task = FetchListOfVersionsTask::new(
            registry,
            status.clone(),
            notifier.clone(),
            engine.downgrade(),
            Uuid::new_v4(),
        )
        .with_release_index_url(format!("http://{addr}/releases"));
        let handle = TaskHandle::new(Uuid::new_v4());

        task.execute(&handle).await;

        assert_eq!(request_count.load(Ordering::SeqCst), 1);
        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        // Tolerate the reset epoch having been computed a whole wall-clock second before
        // `handle_rate_limited` reads `now_epoch_secs()`.
        assert!(
            messages[0].contains(&format!("wait {reset_in}s")) || messages[0].contains(&format!("wait {}s", reset_in - 1)),
            "expected the banner to state a wait close to {reset_in}s, got {:?}",
            messages[0]
        );

        // No new request should land before the reset: the resubmission is gated on the
        // exact wait just computed, not on the admission loop's poll interval alone.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(request_count.load(Ordering::SeqCst), 1, "resubmission fired before the rate-limit reset");

        // After the reset elapses, exactly one resubmission should have gone out, and the
        // success response it receives should dismiss the warning banner and mark the fetch
        // Completed without scheduling any further retry.
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(request_count.load(Ordering::SeqCst), 2, "expected exactly one resubmission");
        assert_eq!(status.get(), FetchStatus::Completed);

        // Give a hypothetical stray third resubmission time to land, and confirm it doesn't.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(request_count.load(Ordering::SeqCst), 2);
    }
}
