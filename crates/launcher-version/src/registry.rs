//! The version registry: a sorted, thread-safe catalogue merging local installs with the
//! remote release index.

use crate::error::{Error, Result};
use crate::name::VersionName;
use crate::reference::VersionRef;
use crate::version::{InstallationStatus, Version};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// A handle to an in-flight install task, opaque to this crate.
///
/// `launcher-version` has no dependency on the task engine or the install task itself; this
/// trait is the seam `launcher-install` implements so the registry can still deduplicate
/// concurrent install requests for the same version (see [`VersionRegistry::get_or_submit_install`]).
pub trait InstallHandle: Send + Sync + std::fmt::Debug {
    /// Whether the task has reached a terminal state (done, cancelled or failed).
    fn is_terminal(&self) -> bool;
}

struct Inner {
    /// Sorted descending by [`VersionName`]; latest first.
    versions: Vec<Version>,
    index: HashMap<String, usize>,
    install_tasks: HashMap<String, Arc<dyn InstallHandle>>,
}

impl Inner {
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, v) in self.versions.iter().enumerate() {
            self.index.insert(v.name.as_str().to_string(), i);
        }
    }

    fn insert_sorted(&mut self, version: Version) -> usize {
        let pos = self
            .versions
            .binary_search_by(|probe| probe.name.cmp(&version.name))
            .unwrap_or_else(|insert_at| insert_at);
        self.versions.insert(pos, version);
        self.rebuild_index();
        pos
    }

    fn find_or_create(&mut self, name: &VersionName) -> usize {
        if let Some(&i) = self.index.get(name.as_str()) {
            return i;
        }
        self.insert_sorted(Version::new(name.clone()))
    }
}

/// Thread-safe, cheaply-cloneable handle to the version catalogue.
#[derive(Clone)]
pub struct VersionRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl Default for VersionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                versions: Vec::new(),
                index: HashMap::new(),
                install_tasks: HashMap::new(),
            })),
        }
    }

    /// Scans `installed_versions_dir` for version directories and seeds the registry with
    /// them, marked [`InstallationStatus::Installed`]. Entries are read by filename (not
    /// stem, so a version string containing a dot like `2.1.0` isn't truncated), and
    /// non-directories are skipped rather than treated as an error.
    pub fn scan_installed(installed_versions_dir: &Path) -> Result<Self> {
        let registry = Self::new();
        let entries = match std::fs::read_dir(installed_versions_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(registry),
            Err(source) => {
                return Err(Error::Io {
                    name: installed_versions_dir.display().to_string(),
                    source,
                });
            }
        };

        let mut inner = registry.inner.write().expect("registry lock poisoned");
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let version_name = VersionName::parse(name);
            if inner.index.contains_key(version_name.as_str()) {
                continue;
            }
            inner.insert_sorted(Version::installed(version_name));
        }
        inner.versions.sort_by(|a, b| a.name.cmp(&b.name));
        inner.rebuild_index();
        drop(inner);
        Ok(registry)
    }

    pub fn find(&self, name: &VersionName) -> Option<Version> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.index.get(name.as_str()).map(|&i| inner.versions[i].clone())
    }

    /// Resolves a [`VersionRef`] against current state.
    pub fn find_installed(&self, reference: &VersionRef) -> Option<Version> {
        match reference {
            VersionRef::Latest | VersionRef::LatestInstalled => self.latest_installed(),
            VersionRef::Exact(name) => self.find(name).filter(Version::is_installed),
        }
    }

    pub fn latest(&self) -> Option<Version> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.versions.iter().find(|v| v.name.is_valid()).cloned()
    }

    pub fn latest_installed(&self) -> Option<Version> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.versions.iter().find(|v| v.is_installed()).cloned()
    }

    pub fn latest_with_download_url(&self) -> Option<Version> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner
            .versions
            .iter()
            .find(|v| v.download_url.is_some())
            .cloned()
    }

    pub fn any_installed(&self) -> bool {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.versions.iter().any(Version::is_installed)
    }

    /// Attaches a download url to a version, creating it (as [`InstallationStatus::NotInstalled`])
    /// if unknown. A version that already has a *different* url logs a warning rather than
    /// erroring: this is a design-time invariant, not something worth crashing a background
    /// fetch over.
    pub fn set_download_url(&self, name: &VersionName, url: impl Into<String>) {
        let url = url.into();
        let mut inner = self.inner.write().expect("registry lock poisoned");
        let i = inner.find_or_create(name);
        match &inner.versions[i].download_url {
            Some(existing) if existing != &url => {
                tracing::warn!(name = %name, existing, new = %url, "version already has a different download url");
            }
            _ => inner.versions[i].download_url = Some(url),
        }
    }

    /// Creates-or-updates a version's installation status. On transition to `Installed` or
    /// `NotInstalled` the in-flight install-task entry for this name, if any, is dropped.
    pub fn set_installation_status(&self, name: &VersionName, status: InstallationStatus) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        let i = inner.find_or_create(name);
        inner.versions[i].installation_status = status;
        if matches!(
            status,
            InstallationStatus::Installed | InstallationStatus::NotInstalled
        ) {
            inner.install_tasks.remove(name.as_str());
        }
    }

    /// Recursively deletes the install directory and marks the version not installed. I/O
    /// errors are logged, not propagated: the registry's in-memory state is left unchanged
    /// on failure so a half-deleted directory doesn't get treated as gone.
    pub fn uninstall(&self, name: &VersionName, installed_versions_dir: &Path) {
        let path = installed_versions_dir.join(name.as_str());
        let result = std::fs::remove_dir_all(&path);
        if result.is_ok() || !path.exists() {
            self.set_installation_status(name, InstallationStatus::NotInstalled);
        } else if let Err(e) = result {
            tracing::warn!(name = %name, path = %path.display(), error = %e, "failed to remove install directory");
        }
    }

    /// Returns the existing in-flight install task for `name`, or creates one via `create`,
    /// registers it, and returns that. At most one install task per version name is ever in
    /// flight at a time.
    pub fn get_or_submit_install(
        &self,
        name: &VersionName,
        create: impl FnOnce() -> Arc<dyn InstallHandle>,
    ) -> Arc<dyn InstallHandle> {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if let Some(existing) = inner.install_tasks.get(name.as_str()) {
            if !existing.is_terminal() {
                return existing.clone();
            }
        }
        let handle = create();
        inner
            .install_tasks
            .insert(name.as_str().to_string(), handle.clone());
        handle
    }

    /// The most-recently-submitted install task still in flight, if any (iterates in
    /// registry order, which is descending, so the first non-terminal entry is the
    /// numerically-latest in-progress one).
    pub fn latest_installing(&self) -> Option<Arc<dyn InstallHandle>> {
        let inner = self.inner.read().expect("registry lock poisoned");
        for version in &inner.versions {
            if let Some(handle) = inner.install_tasks.get(version.name.as_str()) {
                if !handle.is_terminal() {
                    return Some(handle.clone());
                }
            }
        }
        None
    }

    pub fn all(&self) -> Vec<Version> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.versions.clone()
    }
}
