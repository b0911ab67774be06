//! Command-line argument parsing, grounded on `vx-cli`'s use of `clap` derive.

use clap::Parser;
use std::path::PathBuf;

/// Launches the application, installing the required version first if needed.
///
/// Called with no arguments, opens the launcher's project picker against the latest
/// installed version. Called with a project file path (as the OS file-association handler
/// does), opens that file with the version it was created with.
#[derive(Debug, Parser)]
#[command(name = "launcher", version, about)]
pub struct Cli {
    /// An existing project file to open immediately, as if passed by the OS's
    /// file-association handler.
    pub project_file: Option<PathBuf>,

    /// Raise the log level to debug for this crate.
    #[arg(long)]
    pub verbose: bool,

    /// Raise the log level to debug for every crate.
    #[arg(long)]
    pub debug: bool,

    /// Overrides the resolved user data directory. Mainly useful for running isolated
    /// instances side by side, e.g. in tests.
    #[arg(long)]
    pub user_data_dir: Option<PathBuf>,
}
