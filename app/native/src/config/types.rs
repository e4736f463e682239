//! Configuration types for Daywall.
//!
//! This module provides the configuration types and loading functionality.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{APP_NAME, DEFAULT_PROMPT};
use crate::platform::{data_subdir, expand_and_resolve};

/// Remote image generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Base URL of the OpenAI-compatible API, without the trailing endpoint.
    /// Default: "https://api.openai.com/v1"
    pub base_url: String,

    /// Image model to request.
    /// Default: "dall-e-3"
    pub model: String,

    /// Requested image size in `WIDTHxHEIGHT` form.
    /// Default: "1024x1024"
    pub size: String,

    /// Prompt sent to the generator. Empty uses the built-in prompt.
    pub prompt: String,

    /// Seconds to wait for the connection to be established.
    /// Default: 30
    pub connect_timeout: u64,

    /// Seconds to wait for the generation response.
    /// Default: 60
    pub request_timeout: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            prompt: String::new(),
            connect_timeout: 30,
            request_timeout: 60,
        }
    }
}

impl GeneratorConfig {
    /// Returns the configured prompt, or the built-in one when unset.
    #[must_use]
    pub fn prompt(&self) -> &str {
        let prompt = self.prompt.trim();
        if prompt.is_empty() { DEFAULT_PROMPT } else { prompt }
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout) }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout) }
}

/// Where the generation credential is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CredentialsConfig {
    /// Path to a `.env` file containing `OPENAI_API_KEY`.
    /// Relative paths are resolved against the config file's directory.
    /// Empty uses `<data dir>/daywall/.env`.
    pub env_file: String,
}

/// Retry behaviour for the remote generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total number of generation attempts per run (minimum 1).
    /// Default: 3
    pub max_attempts: u32,

    /// Fixed delay between failed attempts, in seconds.
    /// Default: 60
    pub delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self { Self { max_attempts: 3, delay_seconds: 60 } }
}

/// Image download settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadConfig {
    /// Seconds before a download is abandoned.
    /// Default: 60
    pub timeout_seconds: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self { Self { timeout_seconds: 60 } }
}

impl DownloadConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_seconds) }
}

/// Dimensions of the locally synthesized fallback gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FallbackConfig {
    /// Width in pixels.
    /// Default: 1080
    pub width: u32,

    /// Height in pixels.
    /// Default: 1920
    pub height: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self { Self { width: 1080, height: 1920 } }
}

/// Image storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory where generated images are written.
    /// Supports `~`. Empty uses `<data dir>/daywall/wallpapers`.
    pub path: String,
}

impl StorageConfig {
    /// Resolves the storage directory, falling back to the data directory.
    #[must_use]
    pub fn resolve(&self, config_dir: &Path) -> PathBuf {
        if self.path.trim().is_empty() {
            data_subdir("wallpapers")
        } else {
            expand_and_resolve(&self.path, config_dir)
        }
    }
}

/// Longest accepted recurring interval, one year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Recurring job settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleConfig {
    /// Hours between recurring runs, from 1 to 8760.
    /// Default: 24
    pub interval_hours: u64,

    /// Only dispatch the recurring job while the generator host is reachable.
    /// Default: true
    pub require_network: bool,

    /// Seconds between daemon scheduling ticks.
    /// Default: 60
    pub tick_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            require_network: true,
            tick_seconds: 60,
        }
    }
}

impl ScheduleConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(3600))
    }

    #[must_use]
    pub const fn tick(&self) -> Duration { Duration::from_secs(self.tick_seconds) }
}

/// Desktop wallpaper settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct WallpaperConfig {
    /// Apply each stored image as the desktop wallpaper.
    /// Default: true
    pub apply: bool,
}

impl Default for WallpaperConfig {
    fn default() -> Self { Self { apply: true } }
}

/// Root configuration for Daywall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DaywallConfig {
    /// Remote image generator.
    pub generator: GeneratorConfig,

    /// Credential source.
    pub credentials: CredentialsConfig,

    /// Retry policy for generation attempts.
    pub retry: RetryConfig,

    /// Image download settings.
    pub download: DownloadConfig,

    /// Fallback gradient dimensions.
    pub fallback: FallbackConfig,

    /// Image storage location.
    pub storage: StorageConfig,

    /// Recurring job settings.
    pub schedule: ScheduleConfig,

    /// Desktop wallpaper settings.
    pub wallpaper: WallpaperConfig,
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. \
         Expected at ~/.config/daywall/config.jsonc or ~/.daywall.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
    /// A value is outside its accepted range.
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl DaywallConfig {
    /// Checks values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.maxAttempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fallback.width == 0 || self.fallback.height == 0 {
            return Err(ConfigError::Invalid {
                field: "fallback",
                reason: format!(
                    "dimensions must be non-zero, got {}x{}",
                    self.fallback.width, self.fallback.height
                ),
            });
        }
        if !(1..=MAX_INTERVAL_HOURS).contains(&self.schedule.interval_hours) {
            return Err(ConfigError::Invalid {
                field: "schedule.intervalHours",
                reason: format!(
                    "must be between 1 and {MAX_INTERVAL_HOURS}, got {}",
                    self.schedule.interval_hours
                ),
            });
        }
        if self.schedule.tick_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "schedule.tickSeconds",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Home-directory configuration file names.
const HOME_CONFIG_FILE_NAMES: &[&str] = &[".daywall.jsonc", ".daywall.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/daywall/config.jsonc` (when set)
/// 2. `~/.config/daywall/config.jsonc`
/// 3. The platform config directory (`~/Library/Application Support/daywall` on macOS)
/// 4. `~/.daywall.jsonc`
///
/// Each location is tried with both `.jsonc` and `.json`.
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    fn push_dir(dir: PathBuf, paths: &mut Vec<PathBuf>) {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            // XDG_CONFIG_HOME is often ~/.config
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        push_dir(PathBuf::from(xdg_config).join(APP_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        push_dir(home.join(".config").join(APP_NAME), &mut paths);
    }

    if let Some(config_dir) = dirs::config_dir() {
        push_dir(config_dir.join(APP_NAME), &mut paths);
    }

    if let Some(home) = dirs::home_dir() {
        for filename in HOME_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads and validates a configuration file, stripping JSONC comments.
///
/// # Errors
///
/// Returns `ConfigError::IoError` if the file cannot be read,
/// `ConfigError::ParseError` for invalid JSON, and `ConfigError::Invalid`
/// for values that fail validation.
pub fn load_config_from_path(path: &PathBuf) -> Result<(DaywallConfig, PathBuf), ConfigError> {
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: DaywallConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok((config, path.clone()))
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of
/// the expected locations, or any error from [`load_config_from_path`].
pub fn load_config() -> Result<(DaywallConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}
