//! Tracing initialization, generalizing `vx-cli::tracing_setup`'s priority order
//! (`RUST_LOG` > `--debug` > `--verbose` > a quiet default) down to a plain `fmt` layer: the
//! launcher has no long-running multi-step commands to attach indicatif spans to, so there's
//! no `tracing-indicatif` layer here, only the `EnvFilter` selection logic.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global `tracing` subscriber. Safe to call more than once: only the first
/// call takes effect.
pub fn init(verbose: bool, debug: bool) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::EnvFilter::from_default_env()
        } else if debug {
            tracing_subscriber::EnvFilter::new("debug")
        } else if verbose {
            tracing_subscriber::EnvFilter::new("launcher=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new("launcher=info,warn,error")
        };

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(debug)
            .with_level(verbose || debug)
            .init();
    });
}
