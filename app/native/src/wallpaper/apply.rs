//! Applying a stored image as the desktop wallpaper.

use super::store::StoredImage;

/// Errors that can occur when applying the wallpaper.
#[derive(Debug)]
pub enum ApplyError {
    /// The wallpaper file does not exist.
    FileNotFound(String),
    /// The path cannot be passed to the OS as UTF-8.
    InvalidPath(String),
    /// The OS call failed.
    SetWallpaperFailed(String),
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "Wallpaper file not found: {path}"),
            Self::InvalidPath(path) => write!(f, "Wallpaper path is not valid UTF-8: {path}"),
            Self::SetWallpaperFailed(msg) => write!(f, "Failed to set wallpaper: {msg}"),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Sets a stored image as the desktop wallpaper.
pub trait WallpaperApplier: Send + Sync {
    /// Applies `image`.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError` if the OS rejects the image.
    fn apply(&self, image: &StoredImage) -> Result<(), ApplyError>;
}

/// Applies the current alias through the platform wallpaper API.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallpaper;

impl WallpaperApplier for SystemWallpaper {
    fn apply(&self, image: &StoredImage) -> Result<(), ApplyError> {
        let path = &image.current_path;
        if !path.exists() {
            return Err(ApplyError::FileNotFound(path.display().to_string()));
        }

        let path_str =
            path.to_str().ok_or_else(|| ApplyError::InvalidPath(path.display().to_string()))?;

        wallpaper::set_from_path(path_str)
            .map_err(|e| ApplyError::SetWallpaperFailed(e.to_string()))?;
        tracing::info!(path = %path.display(), "applied wallpaper");
        Ok(())
    }
}

/// Leaves the desktop untouched. Selected when `wallpaper.apply` is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledApplier;

impl WallpaperApplier for DisabledApplier {
    fn apply(&self, image: &StoredImage) -> Result<(), ApplyError> {
        tracing::debug!(path = %image.current_path.display(), "wallpaper apply disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn missing_image() -> StoredImage {
        StoredImage {
            dated_path: PathBuf::from("/nonexistent/ai-wallpaper-2024-01-01.jpg"),
            current_path: PathBuf::from("/nonexistent/current_wallpaper.jpg"),
            bytes: Vec::new(),
        }
    }

    #[test]
    fn test_apply_error_display() {
        let err = ApplyError::SetWallpaperFailed("permission denied".to_string());
        assert!(err.to_string().contains("Failed to set wallpaper"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_system_wallpaper_rejects_missing_file() {
        let err = SystemWallpaper.apply(&missing_image()).unwrap_err();
        assert!(matches!(err, ApplyError::FileNotFound(_)));
    }

    #[test]
    fn test_disabled_applier_always_succeeds() {
        assert!(DisabledApplier.apply(&missing_image()).is_ok());
    }
}
