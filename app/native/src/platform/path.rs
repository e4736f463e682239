//! Path utilities for shell-like path expansion and data directories.
//!
//! Supports tilde (`~`) expansion, relative path resolution against a base
//! directory, and locating the per-user data directory where images and the
//! job registry live.

use std::path::{Path, PathBuf};

use crate::constants::APP_NAME;

/// Expands shell-like paths (tilde) to absolute paths.
///
/// Absolute and relative paths are returned unchanged; use
/// [`expand_and_resolve`] to anchor relative paths to a base directory.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

/// Expands shell-like paths and resolves relative paths against `base_dir`.
///
/// # Examples
///
/// ```ignore
/// use std::path::Path;
/// use daywall_lib::platform::expand_and_resolve;
///
/// let base = Path::new("/config/dir");
/// assert_eq!(expand_and_resolve(".env", base), Path::new("/config/dir/.env"));
/// ```
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = expand(path);

    if expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Returns the root data directory for the application.
///
/// `~/.local/share/daywall` on Linux, `~/Library/Application Support/daywall`
/// on macOS, or `$TMPDIR/daywall` when no data directory is known.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || std::env::temp_dir().join(APP_NAME),
        |data| data.join(APP_NAME),
    )
}

/// Returns a subdirectory of the application data directory.
#[must_use]
pub fn data_subdir(subdir: &str) -> PathBuf { data_dir().join(subdir) }
