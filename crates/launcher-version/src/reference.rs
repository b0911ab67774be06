//! Late-bound selectors resolved against the registry at task-execution time.

use crate::name::VersionName;
use std::fmt;
use std::path::PathBuf;

/// A reference to a version that isn't known concretely at submission time.
///
/// Kept as a plain tagged enum rather than a trait object: the set of cases is closed and
/// each is resolved with exhaustive matching, not dynamic dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    /// The numerically greatest known version with a download url.
    Latest,
    /// The numerically greatest installed version.
    LatestInstalled,
    /// A specific, named version.
    Exact(VersionName),
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRef::Latest => write!(f, "latest"),
            VersionRef::LatestInstalled => write!(f, "latest installed"),
            VersionRef::Exact(name) => write!(f, "{name}"),
        }
    }
}

/// What the launched application should do once it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Open an existing project file.
    OpenFile(PathBuf),
    /// Create a new project in a folder (empty path means "use the default").
    CreateNewProjectInFolder(PathBuf),
}
