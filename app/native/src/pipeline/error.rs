use thiserror::Error;

use crate::generator::{DownloadError, GeneratorError};
use crate::wallpaper::{ApplyError, GradientError, StoreError};

/// Why a generation run did not deliver a remote image.
///
/// The first three variants are absorbed by the fallback and only surface as
/// the cause of a fallback delivery. The rest end the run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no credential configured")]
    CredentialMissing,
    #[error("image generation failed after {attempts} attempt(s): {last}")]
    RemoteGenerationFailed { attempts: u32, last: GeneratorError },
    #[error("image download failed: {0}")]
    DownloadFailed(#[from] DownloadError),
    #[error("failed to persist image: {0}")]
    PersistenceFailed(#[from] StoreError),
    #[error("failed to apply wallpaper: {0}")]
    ApplyFailed(#[from] ApplyError),
    #[error("failed to synthesize fallback image: {0}")]
    FallbackFailed(#[from] GradientError),
}

impl GenerationError {
    /// Whether the pipeline recovers from this error with the fallback image.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CredentialMissing | Self::RemoteGenerationFailed { .. } | Self::DownloadFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split() {
        assert!(GenerationError::CredentialMissing.is_recoverable());
        assert!(GenerationError::DownloadFailed(DownloadError::Empty).is_recoverable());
        assert!(
            GenerationError::RemoteGenerationFailed { attempts: 3, last: GeneratorError::Timeout }
                .is_recoverable()
        );
        let persistence = GenerationError::PersistenceFailed(StoreError::Directory("x".into()));
        assert!(!persistence.is_recoverable());
        let apply = GenerationError::ApplyFailed(ApplyError::FileNotFound("x".into()));
        assert!(!apply.is_recoverable());
    }

    #[test]
    fn test_remote_failure_display_includes_attempts() {
        let err = GenerationError::RemoteGenerationFailed {
            attempts: 3,
            last: GeneratorError::Status { status: 500, body: "boom".into() },
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("500"));
    }
}
