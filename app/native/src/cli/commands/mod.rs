//! CLI command definitions using Clap.
//!
//! This module defines all CLI commands and their arguments, organized into
//! domain-specific submodules:
//!
//! - `config_cmd` - Configuration file commands
//! - `credential` - API key management
//! - `generate` - On-demand generation
//! - `schedule` - Recurring job registration and the daemon
//! - `wallpaper` - Current wallpaper lookup

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::error::DaywallError;
use crate::{config, schema};

pub mod config_cmd;
pub mod credential;
pub mod generate;
pub mod schedule;
pub mod wallpaper;

pub use config_cmd::ConfigCommands;
pub use credential::CredentialCommands;
pub use generate::GenerateArgs;
pub use schedule::ScheduleCommands;
pub use wallpaper::CurrentArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Daywall - a fresh AI-generated wallpaper every day.
#[derive(Parser, Debug)]
#[command(name = "daywall")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Generate and apply a new wallpaper now.
    ///
    /// Tries the remote image generator and falls back to a random gradient
    /// when it is unavailable. Exits non-zero if nothing could be stored or
    /// applied.
    #[command(after_long_help = r#"Examples:
  daywall generate             # Run now and wait for the result
  daywall generate --detach    # Queue a run for the daemon"#)]
    Generate(GenerateArgs),

    /// Recurring generation commands.
    #[command(subcommand)]
    Schedule(ScheduleCommands),

    /// Run the scheduler in the foreground.
    ///
    /// Executes the recurring job when it is due and queued runs as they
    /// arrive. Stops on Ctrl-C after in-flight runs complete.
    Daemon,

    /// API key management commands.
    #[command(subcommand)]
    Credential(CredentialCommands),

    /// Print the location of the current wallpaper.
    Current(CurrentArgs),

    /// Create the configuration file or show the paths it resolves to.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output Daywall configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// Daywall configuration file. Can be redirected to a file for use with
    /// editors that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    /// Can be used with eval or redirected to a file.
    ///
    /// Usage:
    ///   eval "$(daywall completions --shell zsh)"
    ///   daywall completions --shell bash > ~/.local/share/bash-completion/completions/daywall
    ///   daywall completions --shell fish > ~/.config/fish/completions/daywall.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<std::path::PathBuf> {
        self.config.as_ref().map(std::path::PathBuf::from)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), DaywallError> {
        if let Some(ref path) = self.config {
            let path_buf = std::path::PathBuf::from(path);
            if !path_buf.exists() {
                return Err(DaywallError::ConfigError(format!(
                    "Configuration file not found: {path}"
                )));
            }
            config::set_custom_config_path(path_buf);
        }

        match &self.command {
            Commands::Generate(args) => generate::execute(args),
            Commands::Schedule(cmd) => schedule::execute(cmd),
            Commands::Daemon => schedule::run_daemon(),
            Commands::Credential(cmd) => credential::execute(cmd),
            Commands::Current(args) => wallpaper::execute(args),
            Commands::Config(cmd) => config_cmd::execute(cmd),

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "daywall", &mut io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from(["daywall", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate(GenerateArgs { detach: false })));
    }

    #[test]
    fn test_cli_parses_generate_detach() {
        let cli = Cli::try_parse_from(["daywall", "generate", "--detach"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate(GenerateArgs { detach: true })));
    }

    #[test]
    fn test_cli_parses_schedule_subcommands() {
        let cli = Cli::try_parse_from(["daywall", "schedule", "enable"]).unwrap();
        assert!(matches!(cli.command, Commands::Schedule(ScheduleCommands::Enable)));

        let cli = Cli::try_parse_from(["daywall", "schedule", "disable"]).unwrap();
        assert!(matches!(cli.command, Commands::Schedule(ScheduleCommands::Disable)));

        let cli = Cli::try_parse_from(["daywall", "schedule", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Schedule(ScheduleCommands::Status { json: true })));
    }

    #[test]
    fn test_cli_parses_daemon() {
        let cli = Cli::try_parse_from(["daywall", "daemon"]).unwrap();
        assert!(matches!(cli.command, Commands::Daemon));
    }

    #[test]
    fn test_cli_parses_credential_set_with_key() {
        let cli = Cli::try_parse_from(["daywall", "credential", "set", "sk-test"]).unwrap();
        match cli.command {
            Commands::Credential(CredentialCommands::Set { key }) => {
                assert_eq!(key.as_deref(), Some("sk-test"));
            }
            _ => panic!("Expected Credential Set command"),
        }
    }

    #[test]
    fn test_cli_parses_credential_set_without_key() {
        let cli = Cli::try_parse_from(["daywall", "credential", "set"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Credential(CredentialCommands::Set { key: None })
        ));
    }

    #[test]
    fn test_cli_parses_credential_status_and_clear() {
        let cli = Cli::try_parse_from(["daywall", "credential", "status"]).unwrap();
        assert!(matches!(cli.command, Commands::Credential(CredentialCommands::Status)));

        let cli = Cli::try_parse_from(["daywall", "credential", "clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Credential(CredentialCommands::Clear)));
    }

    #[test]
    fn test_cli_parses_current_uri() {
        let cli = Cli::try_parse_from(["daywall", "current", "--uri"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Current(CurrentArgs { uri: true, history: false })
        ));
    }

    #[test]
    fn test_cli_parses_current_history() {
        let cli = Cli::try_parse_from(["daywall", "current", "--history", "--uri"]).unwrap();
        assert!(matches!(cli.command, Commands::Current(CurrentArgs { uri: true, history: true })));
    }

    #[test]
    fn test_cli_parses_schema() {
        let cli = Cli::try_parse_from(["daywall", "schema"]).unwrap();
        assert!(matches!(cli.command, Commands::Schema));
    }

    #[test]
    fn test_cli_parses_config_init_force() {
        let cli = Cli::try_parse_from(["daywall", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Init { force: true, stdout: false, .. })
        ));
    }

    #[test]
    fn test_cli_parses_config_show_json() {
        let cli = Cli::try_parse_from(["daywall", "config", "show", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show { json: true })));
    }

    #[test]
    fn test_cli_accepts_config_path_alias() {
        let cli = Cli::try_parse_from(["daywall", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show { json: false })));
    }

    #[test]
    fn test_cli_parses_completions_zsh() {
        let cli = Cli::try_parse_from(["daywall", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_schedule_action() {
        assert!(Cli::try_parse_from(["daywall", "schedule", "pause"]).is_err());
    }

    #[test]
    fn test_app_version_format() {
        assert!(
            APP_VERSION.split('.').count() >= 2,
            "Version should have at least major.minor"
        );
    }

    #[test]
    fn test_cli_parses_config_flag_after_subcommand() {
        // The --config flag is global so can appear before or after subcommand
        let cli =
            Cli::try_parse_from(["daywall", "current", "--config", "/path/to/config.json"])
                .unwrap();
        assert_eq!(cli.config, Some("/path/to/config.json".to_string()));
    }

    #[test]
    fn test_cli_config_path_returns_none_when_not_specified() {
        let cli = Cli::try_parse_from(["daywall", "schema"]).unwrap();
        assert!(cli.config_path().is_none());
    }
}
