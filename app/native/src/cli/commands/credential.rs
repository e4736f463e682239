//! Credential CLI commands.

use std::io::{self, BufRead, Write};

use clap::Subcommand;

use crate::cli::output::{field, mask_credential, yes_no};
use crate::config::{self, env::FileSettingsStore, env::SettingsStore};
use crate::error::DaywallError;

/// Image generation credential commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
#[command(next_display_order = None)]
pub enum CredentialCommands {
    /// Store the API key used for image generation.
    ///
    /// Reads the key from standard input when it is not given as an argument.
    #[command(after_long_help = r#"Examples:
  daywall credential set sk-...          # Store the given key
  pbpaste | daywall credential set       # Read the key from stdin"#)]
    Set {
        /// The API key. Omit to read it from stdin.
        key: Option<String>,
    },

    /// Show whether an API key is configured.
    Status,

    /// Remove the stored API key.
    Clear,
}

fn settings_store() -> FileSettingsStore {
    FileSettingsStore::from_config(config::get_config(), &config::config_dir())
}

/// Execute credential subcommands.
///
/// # Errors
///
/// Returns an error if the key is invalid or the env file cannot be written.
pub fn execute(cmd: &CredentialCommands) -> Result<(), DaywallError> {
    let store = settings_store();

    match cmd {
        CredentialCommands::Set { key } => {
            let key = match key {
                Some(key) => key.clone(),
                None => read_key_from_stdin()?,
            };
            store.set_credential(&key)?;
            println!("API key saved to {}", store.env_path().display());
        }
        CredentialCommands::Status => {
            let credential = store.credential();
            field("Configured", yes_no(credential.is_some()));
            if let Some(credential) = credential {
                field("Key", mask_credential(&credential));
            }
            field("Env file", store.env_path().display());
        }
        CredentialCommands::Clear => {
            store.clear_credential()?;
            println!("API key removed from {}", store.env_path().display());
        }
    }
    Ok(())
}

fn read_key_from_stdin() -> Result<String, DaywallError> {
    eprint!("API key: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let key = line.trim().to_string();
    if key.is_empty() {
        return Err(DaywallError::InvalidArguments("No API key provided".to_string()));
    }
    Ok(key)
}
