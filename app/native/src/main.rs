#![allow(clippy::multiple_crate_versions)]

//! Daywall command-line entry point.
//!
//! Installs the tracing subscriber and dispatches to the CLI. `RUST_LOG`
//! overrides the default log filter.

use daywall_lib::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    if let Err(err) = daywall_lib::cli::run() {
        eprintln!("daywall: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
