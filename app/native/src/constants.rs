//! Application-wide constants.

/// Application name, used for config and data directory names.
pub const APP_NAME: &str = "daywall";

/// Name under which the recurring daily generation job is registered.
pub const DAILY_JOB_NAME: &str = "ai_wallpaper_daily_generator";

/// File stem of the alias that always points at the most recent image.
pub const CURRENT_FILE_STEM: &str = "current_wallpaper";

/// Prefix of the per-day image files (`ai-wallpaper-YYYY-MM-DD.jpg`).
pub const DATED_FILE_PREFIX: &str = "ai-wallpaper-";

/// Extension of every stored image.
pub const IMAGE_EXTENSION: &str = "jpg";

/// JPEG quality used for every stored image.
pub const JPEG_QUALITY: u8 = 95;

/// Environment key holding the image generation credential.
pub const CREDENTIAL_ENV_KEY: &str = "OPENAI_API_KEY";

/// Prompt used when the configuration does not override it.
pub const DEFAULT_PROMPT: &str = "Generate a colorful wallpaper featuring a photorealistic \
character designed with a style inspired by anime. The character is a young girl with large, \
expressive eyes and long hair styled in soft waves. She is dressed in a cute dress and her pose \
is random. The girl's layer is small and features her entire body, placed on a colorful \
background.";

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "daywall=info,daywall_lib=info";

/// Name recorded for on-demand single-shot runs.
pub const ONE_SHOT_JOB_NAME: &str = "ai_wallpaper_one_shot";

/// File name of the persisted job registry inside the data directory.
pub const REGISTRY_FILE_NAME: &str = "jobs.json";
