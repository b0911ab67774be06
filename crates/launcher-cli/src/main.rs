//! Entry point: parses arguments, brings up an [`App`], optionally opens a project file
//! passed on the command line, then waits for every task to settle before saving settings
//! and exiting. Mirrors `main()` in the original launcher: construct the manager, forward
//! argv's project path if any, run the event loop, save on shutdown.

mod app;
mod args;
mod tracing_setup;

use anyhow::Context;
use app::App;
use args::Cli;
use clap::Parser;
use colored::Colorize;
use launcher_paths::LauncherPaths;

// `launcher-install::get_or_submit_install` bridges into async via `block_in_place`, which
// requires a multi-thread runtime.
#[tokio::main(flavor = "multi_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(cli.verbose, cli.debug);

    let paths = match cli.user_data_dir {
        Some(dir) => LauncherPaths::with_base_dir(dir),
        None => LauncherPaths::new().context("could not resolve a user data directory for this platform")?,
    };

    let app = App::start(paths).await.context("failed to start the launcher")?;

    if let Some(project_file) = &cli.project_file {
        app.open_project_file(project_file).await;
    }

    app.wait_until_idle().await;
    app.save_settings()?;

    Ok(())
}
