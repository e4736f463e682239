//! `daywall config`: the configuration file and the locations derived from it.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::json;

use super::generate::registry_path;
use crate::cli::output::{field, print_json};
use crate::config::env::FileSettingsStore;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{self, DaywallConfig, config_paths};
use crate::error::DaywallError;
use crate::wallpaper::ImageStore;

/// Configuration commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Write a commented configuration template.
    ///
    /// Every option is listed with its default and left commented out.
    #[command(after_long_help = r#"Examples:
  daywall config init                          # Write ~/.config/daywall/config.jsonc
  daywall config init --path ./daywall.jsonc   # Write somewhere else
  daywall config init --stdout > config.jsonc  # Print instead of writing"#)]
    Init {
        /// Replace an existing file.
        #[arg(long, short)]
        force: bool,

        /// Where to write the template instead of the preferred location.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the template instead of writing it.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the loaded configuration file and the paths daywall uses.
    ///
    /// Lists where images, the API key, and the job registry live once the
    /// configuration is applied.
    #[command(visible_alias = "path")]
    Show {
        /// Print the effective configuration and paths as JSON.
        #[arg(long, short)]
        json: bool,
    },
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the template cannot be written or output fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), DaywallError> {
    match cmd {
        ConfigCommands::Init { stdout: true, .. } => {
            print!("{}", generate_config_template());
            Ok(())
        }
        ConfigCommands::Init { force, path, .. } => {
            let target = path.clone().or_else(preferred_config_path).ok_or_else(|| {
                DaywallError::ConfigError(
                    "no home directory to place the configuration in; pass --path".to_string(),
                )
            })?;
            write_template(&target, *force)?;
            println!("Wrote {}", target.display());
            println!("Uncomment the options you want to change.");
            Ok(())
        }
        ConfigCommands::Show { json } => show(config::get_config(), *json),
    }
}

fn preferred_config_path() -> Option<PathBuf> { config_paths().into_iter().next() }

/// Writes the template to `target`. An existing file is only replaced with `force`.
fn write_template(target: &Path, force: bool) -> Result<(), DaywallError> {
    if target.exists() && !force {
        return Err(DaywallError::ConfigError(format!(
            "{} already exists; use --force to replace it",
            target.display()
        )));
    }
    create_config_file(target).map_err(|err| {
        DaywallError::ConfigError(format!("failed to write {}: {err}", target.display()))
    })
}

fn show(config: &DaywallConfig, as_json: bool) -> Result<(), DaywallError> {
    let config_dir = config::config_dir();
    let store = ImageStore::new(config.storage.resolve(&config_dir));
    let settings = FileSettingsStore::from_config(config, &config_dir);
    let loaded = config::get_config_path();

    if as_json {
        print_json(&json!({
            "file": loaded,
            "storage": store.root(),
            "envFile": settings.env_path(),
            "registry": registry_path(),
            "config": config,
        }))?;
        return Ok(());
    }

    match loaded {
        Some(path) => field("Config", path.display()),
        None => field("Config", "defaults (no file found)"),
    }
    field("Storage", store.root().display());
    field("Current", store.current_path().display());
    field("Env file", settings.env_path().display());
    field("Registry", registry_path().display());

    if loaded.is_none() {
        println!("\nSearched:");
        for path in config_paths() {
            println!("  {}", path.display());
        }
        println!("Run `daywall config init` to create one.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_preferred_path_is_a_jsonc_file() {
        if let Some(path) = preferred_config_path() {
            assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("jsonc"));
        }
    }

    #[test]
    fn test_write_template_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        fs::write(&path, "{}").unwrap();

        let result = write_template(&path, false);

        assert!(matches!(result, Err(DaywallError::ConfigError(msg)) if msg.contains("--force")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_write_template_with_force_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        fs::write(&path, "{}").unwrap();

        write_template(&path, true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), generate_config_template());
    }
}
