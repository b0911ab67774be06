//! The `Version` record held by the registry.

use crate::name::VersionName;

/// Installation state of a single [`Version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InstallationStatus {
    NotInstalled,
    Installing,
    Installed,
    FailedToInstall,
}

/// A release as known to the registry: its name, whether it's installed, and where to
/// download it from if it isn't.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Version {
    pub name: VersionName,
    pub download_url: Option<String>,
    pub installation_status: InstallationStatus,
}

impl Version {
    pub fn new(name: VersionName) -> Self {
        Self {
            name,
            download_url: None,
            installation_status: InstallationStatus::NotInstalled,
        }
    }

    pub fn installed(name: VersionName) -> Self {
        Self {
            name,
            download_url: None,
            installation_status: InstallationStatus::Installed,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installation_status == InstallationStatus::Installed
    }
}
