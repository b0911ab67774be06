//! `InstallTask`: downloads a version's release archive and extracts it into place.

use crate::downloader::Downloader;
use crate::extract::extract_zip;
use crate::progress::{default_progress_reporter, ProgressReporter};
use launcher_tasks::notify::{Level, Notifier};
use launcher_tasks::{Task, TaskHandle};
use launcher_version::{InstallHandle, InstallationStatus, VersionName, VersionRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Wraps a [`TaskHandle`] so the registry's install-task-dedup table (which only depends on
/// [`InstallHandle`], not on this crate's task types) can poll whether an install is done.
#[derive(Debug, Clone)]
pub struct InstallTaskHandle(pub TaskHandle);

impl InstallHandle for InstallTaskHandle {
    fn is_terminal(&self) -> bool {
        self.0.is_terminal()
    }
}

/// Downloads and extracts a single version. Cancellation is polled between the download and
/// the extraction, and after every downloaded chunk; a half-finished install directory is
/// removed rather than left around as a corrupt install.
pub struct InstallTask {
    registry: VersionRegistry,
    version_name: VersionName,
    download_url: String,
    install_dir: PathBuf,
    notifier: Arc<dyn Notifier>,
    downloader: Downloader,
    progress: Arc<dyn ProgressReporter>,
}

impl InstallTask {
    pub fn new(
        registry: VersionRegistry,
        version_name: VersionName,
        download_url: String,
        install_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            version_name,
            download_url,
            install_dir,
            notifier,
            downloader: Downloader::new(),
            progress: default_progress_reporter(),
        }
    }

    #[cfg(test)]
    pub fn with_progress_reporter(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    fn cleanup_partial_install(&self) {
        if self.install_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.install_dir) {
                tracing::warn!(
                    path = %self.install_dir.display(),
                    error = %e,
                    "failed to remove partial install directory"
                );
            }
        }
    }

    fn fail(&self, reason: &str) {
        tracing::warn!(version = %self.version_name, reason, "install failed");
        self.cleanup_partial_install();
        self.registry
            .set_installation_status(&self.version_name, InstallationStatus::FailedToInstall);
        self.notifier.send(
            Level::Error,
            "Failed to install version",
            &format!("Could not install version {}: {reason}", self.version_name),
        );
    }
}

/// Path of the in-progress download archive, as a sibling of `install_dir`. Appends rather
/// than using `PathBuf::with_extension`, which would replace everything after the last `.`
/// in the final component and collapse e.g. `2.1.0` and `2.1.5` (or `2.1.0`/`2.1.0-beta`) to
/// the same path.
fn partial_archive_path(install_dir: &Path) -> PathBuf {
    let mut archive_name = install_dir.as_os_str().to_owned();
    archive_name.push(".zip.part");
    PathBuf::from(archive_name)
}

#[async_trait::async_trait]
impl Task for InstallTask {
    fn name(&self) -> String {
        format!("Installing version {}", self.version_name)
    }

    fn is_quick(&self) -> bool {
        false
    }

    async fn execute(&self, handle: &TaskHandle) {
        self.registry
            .set_installation_status(&self.version_name, InstallationStatus::Installing);

        let archive_path = partial_archive_path(&self.install_dir);
        let cancel_requested = || handle.cancel_requested();

        if let Err(e) = self
            .downloader
            .download(&self.download_url, &archive_path, &cancel_requested, self.progress.as_ref())
            .await
        {
            let _ = std::fs::remove_file(&archive_path);
            if e.is_cancelled() {
                tracing::info!(version = %self.version_name, "install cancelled during download");
                self.registry
                    .set_installation_status(&self.version_name, InstallationStatus::NotInstalled);
                return;
            }
            handle.report_failed();
            self.fail(&e.to_string());
            return;
        }

        if handle.cancel_requested() {
            let _ = std::fs::remove_file(&archive_path);
            tracing::info!(version = %self.version_name, "install cancelled before extraction");
            self.registry
                .set_installation_status(&self.version_name, InstallationStatus::NotInstalled);
            return;
        }

        let extraction = extract_zip(&archive_path, &self.install_dir, Some(self.progress.as_ref())).await;
        let _ = std::fs::remove_file(&archive_path);

        if let Err(e) = extraction {
            handle.report_failed();
            self.fail(&e.to_string());
            return;
        }

        self.registry
            .set_installation_status(&self.version_name, InstallationStatus::Installed);
        tracing::info!(version = %self.version_name, "install completed");
    }

    async fn cleanup(&self, was_cancelled: bool) {
        if was_cancelled {
            self.cleanup_partial_install();
            self.registry
                .set_installation_status(&self.version_name, InstallationStatus::NotInstalled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoOpProgressReporter;
    use launcher_tasks::notify::NoOpNotifier;
    use std::time::Duration;
    use uuid::Uuid;

    fn new_task(registry: VersionRegistry, install_dir: PathBuf, url: &str) -> InstallTask {
        InstallTask::new(
            registry,
            VersionName::parse("2.1.0"),
            url.to_string(),
            install_dir,
            Arc::new(NoOpNotifier),
        )
        .with_progress_reporter(Arc::new(NoOpProgressReporter))
    }

    #[tokio::test]
    async fn failed_download_marks_failed_and_cleans_up() {
        let registry = VersionRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let install_dir = dir.path().join("2.1.0");
        let task = new_task(registry.clone(), install_dir.clone(), "http://127.0.0.1:1/unreachable");
        let handle = TaskHandle::new(Uuid::new_v4());

        task.execute(&handle).await;

        assert!(!install_dir.exists());
        assert_eq!(
            registry.find(&VersionName::parse("2.1.0")).unwrap().installation_status,
            InstallationStatus::FailedToInstall
        );
    }

    /// A minimal HTTP server that sends its body one byte at a time with a pause in between,
    /// giving a cancel request time to land mid-stream. Runs on its own thread since it just
    /// blocks on socket I/O; no need to pull it into the tokio runtime under test.
    fn spawn_slow_http_server() -> (std::net::SocketAddr, std::sync::Arc<std::sync::atomic::AtomicBool>) {
        use std::io::Write;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_for_server = stop.clone();

        std::thread::spawn(move || {
            if let Ok((mut socket, _)) = listener.accept() {
                let body = vec![b'x'; 64];
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes());
                for byte in body {
                    if stop_for_server.load(std::sync::atomic::Ordering::SeqCst) {
                        return;
                    }
                    let _ = socket.write_all(&[byte]);
                    let _ = socket.flush();
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        });

        (addr, stop)
    }

    #[tokio::test]
    async fn cancelling_during_download_reverts_to_not_installed() {
        let (addr, stop_server) = spawn_slow_http_server();
        let registry = VersionRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let install_dir = dir.path().join("2.1.0");
        let task = new_task(registry.clone(), install_dir.clone(), &format!("http://{addr}/archive.zip"));
        let handle = TaskHandle::new(Uuid::new_v4());

        handle.request_cancel();
        task.execute(&handle).await;
        stop_server.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(!install_dir.exists());
        assert_eq!(
            registry.find(&VersionName::parse("2.1.0")).unwrap().installation_status,
            InstallationStatus::NotInstalled
        );
    }

    #[test]
    fn partial_archive_path_keeps_versions_sharing_a_major_minor_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let a = partial_archive_path(&dir.path().join("2.1.0"));
        let b = partial_archive_path(&dir.path().join("2.1.5"));
        let c = partial_archive_path(&dir.path().join("2.1.0-beta"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.file_name().unwrap().to_str().unwrap(), "2.1.0.zip.part");
    }
}
