//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r##"// Daywall Configuration File
// ==========================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.

{
  // ============================================================================
  // Image Generator
  // ============================================================================
  // "generator": {
  //   // OpenAI-compatible API base URL
  //   "baseUrl": "https://api.openai.com/v1",
  //
  //   // Image model and requested size
  //   "model": "dall-e-3",
  //   "size": "1024x1024",
  //
  //   // Prompt sent to the generator (empty = built-in anime character prompt)
  //   "prompt": "",
  //
  //   // Connection and response timeouts in seconds
  //   "connectTimeout": 30,
  //   "requestTimeout": 60
  // },

  // ============================================================================
  // Credentials
  // ============================================================================
  // "credentials": {
  //   // Path to .env file containing OPENAI_API_KEY
  //   // Relative paths are resolved against this file's directory.
  //   // Empty uses the data directory. `daywall credential set` writes here.
  //   "envFile": ""
  // },

  // ============================================================================
  // Retry and Download
  // ============================================================================
  // "retry": {
  //   // Generation attempts per run
  //   "maxAttempts": 3,
  //
  //   // Fixed delay between failed attempts, in seconds
  //   "delaySeconds": 60
  // },
  //
  // "download": {
  //   // Seconds before an image download is abandoned
  //   "timeoutSeconds": 60
  // },

  // ============================================================================
  // Fallback Gradient
  // ============================================================================
  // Used when no credential is configured or the generator is unavailable.
  // "fallback": {
  //   "width": 1080,
  //   "height": 1920
  // },

  // ============================================================================
  // Storage
  // ============================================================================
  // "storage": {
  //   // Directory for ai-wallpaper-YYYY-MM-DD.jpg and current_wallpaper.jpg
  //   // Empty uses <data dir>/daywall/wallpapers
  //   "path": ""
  // },

  // ============================================================================
  // Schedule
  // ============================================================================
  // "schedule": {
  //   // Hours between recurring runs (1 to 8760)
  //   "intervalHours": 24,
  //
  //   // Skip dispatch while the generator host is unreachable
  //   "requireNetwork": true,
  //
  //   // Seconds between daemon ticks
  //   "tickSeconds": 60
  // },

  // ============================================================================
  // Desktop Wallpaper
  // ============================================================================
  // "wallpaper": {
  //   // Apply each new image as the desktop wallpaper
  //   "apply": true
  // }
}
"##
    .to_string()
}

/// Writes the configuration template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::DaywallConfig;

    #[test]
    fn test_generate_config_template_parses_as_jsonc() {
        let template = generate_config_template();
        let reader = json_comments::StripComments::new(template.as_bytes());
        let config: DaywallConfig = serde_json::from_reader(reader).unwrap();
        assert_eq!(config, DaywallConfig::default());
    }

    #[test]
    fn test_generate_config_template_contains_all_sections() {
        let template = generate_config_template();
        for section in [
            "generator",
            "credentials",
            "retry",
            "download",
            "fallback",
            "storage",
            "schedule",
            "wallpaper",
        ] {
            assert!(template.contains(&format!("\"{section}\"")), "missing {section}");
        }
    }

    #[test]
    fn test_create_config_file_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.jsonc");

        create_config_file(&path).unwrap();

        assert!(path.exists());
    }
}
