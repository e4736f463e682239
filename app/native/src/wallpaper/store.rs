//! Durable image storage.
//!
//! Every image is written twice: once under a per-day name
//! (`ai-wallpaper-YYYY-MM-DD.jpg`) and once under the `current_wallpaper.jpg`
//! alias. Each write goes to a temporary file in the same directory, is
//! fsynced, and then renamed into place, so readers only ever observe a
//! complete previous or complete new file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::constants::{CURRENT_FILE_STEM, DATED_FILE_PREFIX, IMAGE_EXTENSION};

/// Errors that can occur while committing an image.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage directory could not be created.
    #[error("failed to create storage directory: {0}")]
    Directory(String),
    /// The per-day file could not be written.
    #[error("failed to write dated image: {0}")]
    DatedWrite(String),
    /// The current alias could not be written.
    #[error("failed to write current image: {0}")]
    CurrentWrite(String),
    /// Neither file could be written.
    #[error("failed to write dated image ({dated}) and current image ({current})")]
    BothWrites { dated: String, current: String },
}

/// An image that has been durably committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub dated_path: PathBuf,
    pub current_path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Filesystem-backed image store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Path of the alias that always holds the most recent image.
    #[must_use]
    pub fn current_path(&self) -> PathBuf {
        self.root.join(format!("{CURRENT_FILE_STEM}.{IMAGE_EXTENSION}"))
    }

    /// Path of the image stored for `date`.
    #[must_use]
    pub fn dated_path(&self, date: NaiveDate) -> PathBuf {
        self.root.join(format!(
            "{DATED_FILE_PREFIX}{}.{IMAGE_EXTENSION}",
            date.format("%Y-%m-%d")
        ))
    }

    /// Commits `bytes` under today's date (local time) and the current alias.
    ///
    /// # Errors
    ///
    /// See [`ImageStore::commit_on`].
    pub fn commit(&self, bytes: Vec<u8>) -> Result<StoredImage, StoreError> {
        self.commit_on(Local::now().date_naive(), bytes)
    }

    /// Commits `bytes` under `date` and the current alias.
    ///
    /// The two writes are independent: a failure of one does not undo the
    /// other. A later commit on the same date overwrites that day's file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created or either
    /// write fails.
    pub fn commit_on(&self, date: NaiveDate, bytes: Vec<u8>) -> Result<StoredImage, StoreError> {
        fs::create_dir_all(&self.root)
            .map_err(|err| StoreError::Directory(format!("{}: {err}", self.root.display())))?;

        let dated_path = self.dated_path(date);
        let current_path = self.current_path();

        let dated = write_atomic(&dated_path, &bytes);
        let current = write_atomic(&current_path, &bytes);

        match (dated, current) {
            (Ok(()), Ok(())) => {
                tracing::debug!(
                    dated = %dated_path.display(),
                    current = %current_path.display(),
                    size = bytes.len(),
                    "committed image"
                );
                Ok(StoredImage { dated_path, current_path, bytes })
            }
            (Err(dated), Ok(())) => Err(StoreError::DatedWrite(dated.to_string())),
            (Ok(()), Err(current)) => Err(StoreError::CurrentWrite(current.to_string())),
            (Err(dated), Err(current)) => Err(StoreError::BothWrites {
                dated: dated.to_string(),
                current: current.to_string(),
            }),
        }
    }

    /// Whether a current image exists.
    #[must_use]
    pub fn current_exists(&self) -> bool { self.current_path().is_file() }

    /// Location of the current image, or `None` if nothing has been stored.
    #[must_use]
    pub fn read_current_location(&self) -> Option<PathBuf> {
        let path = self.current_path();
        path.is_file().then_some(path)
    }

    /// Dated images in the store, oldest first.
    #[must_use]
    pub fn dated_images(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut images: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name().and_then(|name| name.to_str()).is_some_and(|name| {
                    name.starts_with(DATED_FILE_PREFIX)
                        && name.ends_with(&format!(".{IMAGE_EXTENSION}"))
                })
            })
            .collect();
        // YYYY-MM-DD sorts chronologically
        images.sort();
        images
    }
}

/// Writes `bytes` to `path` through a same-directory temporary file.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
