//! Credential and prompt settings.
//!
//! The generation credential lives in an environment file (`.env` format)
//! instead of the configuration file. Parsing uses the `dotenvy` crate;
//! writes replace the file atomically so a concurrent reader never sees a
//! truncated file.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;

use crate::config::DaywallConfig;
use crate::constants::{CREDENTIAL_ENV_KEY, DEFAULT_PROMPT};
use crate::platform::{data_dir, expand_and_resolve};

/// Errors raised while reading or writing the credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The provided credential is empty or whitespace.
    #[error("credential must not be empty")]
    Empty,
    /// The credential contains characters that cannot be stored in an env file.
    #[error("credential must be a single token without whitespace or quotes")]
    Malformed,
    /// The env file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Access to user settings consumed by a generation run.
pub trait SettingsStore: Send + Sync {
    /// Returns the generation credential, or `None` when unset or blank.
    fn credential(&self) -> Option<String>;

    /// Stores a new credential, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the value is invalid or cannot be persisted.
    fn set_credential(&self, value: &str) -> Result<(), CredentialError>;

    /// Removes the stored credential.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Write` if the backing store cannot be updated.
    fn clear_credential(&self) -> Result<(), CredentialError>;

    /// Returns the prompt sent to the generator.
    fn prompt_template(&self) -> String;

    /// Whether a non-empty credential is available.
    fn has_credential(&self) -> bool { self.credential().is_some() }
}

/// Parses an environment file and returns a map of key-value pairs.
///
/// Returns an empty map if the file doesn't exist or can't be read.
#[must_use]
pub fn parse_env_file(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.filter_map(Result::ok).collect(),
        Err(err) => {
            if path.exists() {
                tracing::warn!(error = %err, path = %path.display(), "failed to read env file");
            }
            HashMap::new()
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_credential(value: &str) -> Result<&str, CredentialError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CredentialError::Empty);
    }
    if value.chars().any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\')) {
        return Err(CredentialError::Malformed);
    }
    Ok(value)
}

/// Settings backed by a `.env` file, with the process environment as fallback.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    env_path: PathBuf,
    prompt: String,
    read_process_env: bool,
}

impl FileSettingsStore {
    #[must_use]
    pub fn new(env_path: impl Into<PathBuf>, prompt: impl Into<String>) -> Self {
        Self {
            env_path: env_path.into(),
            prompt: prompt.into(),
            read_process_env: true,
        }
    }

    /// Builds the store described by the configuration.
    ///
    /// An empty `credentials.envFile` uses `<data dir>/.env`.
    #[must_use]
    pub fn from_config(config: &DaywallConfig, config_dir: &Path) -> Self {
        let env_path = if config.credentials.env_file.trim().is_empty() {
            data_dir().join(".env")
        } else {
            expand_and_resolve(&config.credentials.env_file, config_dir)
        };
        Self::new(env_path, config.generator.prompt())
    }

    /// Disables the `OPENAI_API_KEY` process environment fallback.
    #[must_use]
    pub const fn with_process_env(mut self, enabled: bool) -> Self {
        self.read_process_env = enabled;
        self
    }

    #[must_use]
    pub fn env_path(&self) -> &Path { &self.env_path }

    /// Lines of the env file that do not assign the credential key.
    fn retained_lines(&self) -> Vec<String> {
        let Ok(content) = fs::read_to_string(&self.env_path) else {
            return Vec::new();
        };
        content
            .lines()
            .filter(|line| {
                let trimmed = line.trim_start();
                let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim_start();
                trimmed
                    .strip_prefix(CREDENTIAL_ENV_KEY)
                    .is_none_or(|rest| !rest.trim_start().starts_with('='))
            })
            .map(str::to_string)
            .collect()
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), CredentialError> {
        let write_err = |source| CredentialError::Write {
            path: self.env_path.clone(),
            source,
        };
        let dir =
            self.env_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        for line in lines {
            writeln!(tmp, "{line}").map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600)).map_err(write_err)?;
        }

        tmp.persist(&self.env_path).map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn credential(&self) -> Option<String> {
        let from_file = non_blank(parse_env_file(&self.env_path).remove(CREDENTIAL_ENV_KEY));
        if from_file.is_some() || !self.read_process_env {
            return from_file;
        }
        non_blank(std::env::var(CREDENTIAL_ENV_KEY).ok())
    }

    fn set_credential(&self, value: &str) -> Result<(), CredentialError> {
        let value = validate_credential(value)?;
        let mut lines = self.retained_lines();
        lines.push(format!("{CREDENTIAL_ENV_KEY}='{value}'"));
        self.write_lines(&lines)?;
        tracing::info!(path = %self.env_path.display(), "stored credential");
        Ok(())
    }

    fn clear_credential(&self) -> Result<(), CredentialError> {
        if !self.env_path.exists() {
            return Ok(());
        }
        let lines = self.retained_lines();
        self.write_lines(&lines)
    }

    fn prompt_template(&self) -> String { self.prompt.clone() }
}

/// Settings held in memory. Used by tests and embedders.
#[derive(Debug)]
pub struct InMemorySettingsStore {
    credential: RwLock<Option<String>>,
    prompt: String,
}

impl InMemorySettingsStore {
    #[must_use]
    pub fn new(credential: Option<&str>) -> Self {
        Self {
            credential: RwLock::new(credential.map(str::to_string)),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn credential(&self) -> Option<String> { non_blank(self.credential.read().clone()) }

    fn set_credential(&self, value: &str) -> Result<(), CredentialError> {
        let value = validate_credential(value)?;
        *self.credential.write() = Some(value.to_string());
        Ok(())
    }

    fn clear_credential(&self) -> Result<(), CredentialError> {
        *self.credential.write() = None;
        Ok(())
    }

    fn prompt_template(&self) -> String { self.prompt.clone() }
}
