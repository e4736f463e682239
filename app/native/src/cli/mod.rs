//! CLI module for Daywall.
//!
//! Every operation (generating, scheduling, credential management, and
//! wallpaper lookup) is exposed as a subcommand of the `daywall` binary.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::DaywallError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), DaywallError> {
    let cli = Cli::parse();
    cli.execute()
}
