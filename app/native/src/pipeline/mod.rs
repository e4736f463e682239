//! End-to-end generation run.
//!
//! A run always ends with an image in the store and an attempt to apply it:
//! the remote generator is tried first, and any credential, generation, or
//! download problem is absorbed by synthesizing a gradient instead. Only
//! storage and apply failures make a run fail.

pub mod error;
pub mod retry;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

pub use error::GenerationError;
pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, ThreadSleeper};

use crate::config::DaywallConfig;
use crate::config::env::{FileSettingsStore, SettingsStore};
use crate::generator::{
    DownloadError, GeneratedImage, GenerationRequest, GeneratorError, ImageDownloader,
    ImageGenerator, OpenAiClient,
};
use crate::scheduler::JobReport;
use crate::wallpaper::encode::normalize_to_jpeg;
use crate::wallpaper::{
    DisabledApplier, ImageStore, StoredImage, SystemWallpaper, WallpaperApplier, gradient,
};

/// Source of randomness for the fallback gradient colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RandomSource {
    /// The thread-local generator.
    #[default]
    Thread,
    /// A generator seeded with a fixed value, for reproducible output.
    Seeded(u64),
}

/// Result of a single run.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// The remote image was stored and applied.
    Delivered { image: StoredImage, source_url: Option<String> },
    /// The fallback gradient was stored and applied because of `cause`.
    FallbackDelivered { image: StoredImage, cause: GenerationError },
    /// The run could not store or apply an image.
    Failed(GenerationError),
}

impl GenerationOutcome {
    #[must_use]
    pub const fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }

    /// The stored image, unless the run failed.
    #[must_use]
    pub const fn image(&self) -> Option<&StoredImage> {
        match self {
            Self::Delivered { image, .. } | Self::FallbackDelivered { image, .. } => Some(image),
            Self::Failed(_) => None,
        }
    }

    /// Short label used in logs and the job registry.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::FallbackDelivered { .. } => "fallback",
            Self::Failed(_) => "failed",
        }
    }
}

impl From<&GenerationOutcome> for JobReport {
    fn from(outcome: &GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Delivered { .. } => Self::success(outcome.label()),
            GenerationOutcome::FallbackDelivered { cause, .. } => {
                Self::success(format!("{}: {cause}", outcome.label()))
            }
            GenerationOutcome::Failed(err) => Self::failure(format!("{}: {err}", outcome.label())),
        }
    }
}

/// Orchestrates credential lookup, generation with retry, download, fallback,
/// storage, and apply.
pub struct GenerationPipeline {
    settings: Arc<dyn SettingsStore>,
    generator: Arc<dyn ImageGenerator>,
    downloader: Arc<dyn ImageDownloader>,
    store: ImageStore,
    applier: Arc<dyn WallpaperApplier>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
    download_timeout: Duration,
    fallback_size: (u32, u32),
    random: RandomSource,
}

impl GenerationPipeline {
    /// Creates a pipeline with default retry, timeout, and fallback settings.
    #[must_use]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        generator: Arc<dyn ImageGenerator>,
        downloader: Arc<dyn ImageDownloader>,
        store: ImageStore,
        applier: Arc<dyn WallpaperApplier>,
    ) -> Self {
        Self {
            settings,
            generator,
            downloader,
            store,
            applier,
            sleeper: Arc::new(ThreadSleeper),
            retry: RetryPolicy::default(),
            download_timeout: Duration::from_secs(60),
            fallback_size: (1080, 1920),
            random: RandomSource::Thread,
        }
    }

    /// Builds the production pipeline described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` if the HTTP client cannot be created.
    pub fn from_config(config: &DaywallConfig, config_dir: &Path) -> Result<Self, GeneratorError> {
        let client = Arc::new(OpenAiClient::new(&config.generator)?);
        let settings = Arc::new(FileSettingsStore::from_config(config, config_dir));
        let store = ImageStore::new(config.storage.resolve(config_dir));
        let applier: Arc<dyn WallpaperApplier> = if config.wallpaper.apply {
            Arc::new(SystemWallpaper)
        } else {
            Arc::new(DisabledApplier)
        };

        Ok(Self::new(settings, client.clone(), client, store, applier)
            .with_retry_policy(RetryPolicy::from_config(&config.retry))
            .with_download_timeout(config.download.timeout())
            .with_fallback_size(config.fallback.width, config.fallback.height))
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub const fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_fallback_size(mut self, width: u32, height: u32) -> Self {
        self.fallback_size = (width, height);
        self
    }

    #[must_use]
    pub const fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &ImageStore { &self.store }

    /// Performs one run. Never panics and never returns early without an outcome.
    pub fn run(&self) -> GenerationOutcome {
        let (bytes, remote) = match self.obtain_remote() {
            Ok((bytes, source_url)) => (bytes, Ok(source_url)),
            Err(err) if !err.is_recoverable() => return self.finish(GenerationOutcome::Failed(err)),
            Err(cause) => {
                tracing::warn!(error = %cause, "using fallback gradient");
                match self.synthesize_fallback() {
                    Ok(bytes) => (bytes, Err(cause)),
                    Err(err) => return self.finish(GenerationOutcome::Failed(err)),
                }
            }
        };

        let image = match self.store.commit(bytes) {
            Ok(image) => image,
            Err(err) => return self.finish(GenerationOutcome::Failed(err.into())),
        };

        if let Err(err) = self.applier.apply(&image) {
            return self.finish(GenerationOutcome::Failed(err.into()));
        }

        self.finish(match remote {
            Ok(source_url) => GenerationOutcome::Delivered { image, source_url },
            Err(cause) => GenerationOutcome::FallbackDelivered { image, cause },
        })
    }

    fn finish(&self, outcome: GenerationOutcome) -> GenerationOutcome {
        match &outcome {
            GenerationOutcome::Failed(err) => {
                tracing::error!(error = %err, "generation run failed");
            }
            other => {
                let path = other.image().map(|image| image.current_path.display().to_string());
                tracing::info!(
                    outcome = other.label(),
                    path = path.as_deref().unwrap_or_default(),
                    store = %self.store.root().display(),
                    "generation run finished"
                );
            }
        }
        outcome
    }

    /// Credential, generation with retry, then download and normalization.
    fn obtain_remote(&self) -> Result<(Vec<u8>, Option<String>), GenerationError> {
        let credential = self.settings.credential().ok_or(GenerationError::CredentialMissing)?;
        let request = GenerationRequest::new(self.settings.prompt_template(), credential);

        let generated = retry::retry(&self.retry, self.sleeper.as_ref(), |attempt| {
            tracing::debug!(attempt, "requesting image");
            self.generator.generate(&request)
        })
        .map_err(|exhausted| GenerationError::RemoteGenerationFailed {
            attempts: exhausted.attempts,
            last: exhausted.last,
        })?;

        let (raw, source_url) = match generated {
            GeneratedImage::Url(url) => {
                tracing::debug!(url = %url, "downloading generated image");
                (self.downloader.download(&url, self.download_timeout)?, Some(url))
            }
            GeneratedImage::Inline(bytes) => (bytes, None),
        };

        let bytes =
            normalize_to_jpeg(&raw).map_err(|err| DownloadError::Decode(err.to_string()))?;
        Ok((bytes, source_url))
    }

    fn synthesize_fallback(&self) -> Result<Vec<u8>, GenerationError> {
        let (width, height) = self.fallback_size;
        let bytes = match self.random {
            RandomSource::Thread => gradient::synthesize(width, height, &mut rand::rng())?,
            RandomSource::Seeded(seed) => {
                gradient::synthesize(width, height, &mut StdRng::seed_from_u64(seed))?
            }
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{Rgb, RgbImage};
    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;
    use crate::config::env::InMemorySettingsStore;
    use crate::wallpaper::ApplyError;
    use crate::wallpaper::encode::encode_jpeg;

    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<GeneratedImage, GeneratorError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<GeneratedImage, GeneratorError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    }

    impl ImageGenerator for ScriptedGenerator {
        fn generate(&self, _: &GenerationRequest) -> Result<GeneratedImage, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses.lock().pop_front().unwrap_or(Err(GeneratorError::EmptyResponse))
        }
    }

    struct FixedDownloader {
        result: fn() -> Result<Vec<u8>, DownloadError>,
        calls: AtomicUsize,
    }

    impl ImageDownloader for FixedDownloader {
        fn download(&self, _: &str, _: Duration) -> Result<Vec<u8>, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn png_bytes() -> Result<Vec<u8>, DownloadError> {
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        Ok(out)
    }

    fn timed_out() -> Result<Vec<u8>, DownloadError> {
        Err(DownloadError::Timeout(Duration::from_secs(60)))
    }

    fn downloader(result: fn() -> Result<Vec<u8>, DownloadError>) -> Arc<FixedDownloader> {
        Arc::new(FixedDownloader { result, calls: AtomicUsize::new(0) })
    }

    #[derive(Default)]
    struct CountingApplier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl WallpaperApplier for CountingApplier {
        fn apply(&self, _: &StoredImage) -> Result<(), ApplyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApplyError::SetWallpaperFailed("no desktop".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        _dir: TempDir,
        pipeline: GenerationPipeline,
        generator: Arc<ScriptedGenerator>,
        downloader: Arc<FixedDownloader>,
        applier: Arc<CountingApplier>,
        sleeper: Arc<RecordingSleeper>,
    }

    fn harness(
        credential: Option<&str>,
        responses: Vec<Result<GeneratedImage, GeneratorError>>,
        download: fn() -> Result<Vec<u8>, DownloadError>,
        applier: CountingApplier,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let generator = ScriptedGenerator::new(responses);
        let downloader = downloader(download);
        let applier = Arc::new(applier);
        let sleeper = Arc::new(RecordingSleeper::new());
        let pipeline = GenerationPipeline::new(
            Arc::new(InMemorySettingsStore::new(credential)),
            generator.clone(),
            downloader.clone(),
            ImageStore::new(dir.path()),
            applier.clone(),
        )
        .with_sleeper(sleeper.clone())
        .with_fallback_size(8, 16)
        .with_random_source(RandomSource::Seeded(9));

        Harness { _dir: dir, pipeline, generator, downloader, applier, sleeper }
    }

    fn url() -> Result<GeneratedImage, GeneratorError> {
        Ok(GeneratedImage::Url("https://images.example/x.png".to_string()))
    }

    fn server_error() -> Result<GeneratedImage, GeneratorError> {
        Err(GeneratorError::Status { status: 500, body: String::new() })
    }

    #[test]
    fn test_missing_credential_skips_network() {
        let h = harness(None, vec![url()], png_bytes, CountingApplier::default());

        let outcome = h.pipeline.run();

        assert!(matches!(
            outcome,
            GenerationOutcome::FallbackDelivered { cause: GenerationError::CredentialMissing, .. }
        ));
        assert_eq!(h.generator.calls(), 0);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.applier.calls.load(Ordering::SeqCst), 1);
        assert!(h.pipeline.store().current_exists());
    }

    #[test]
    fn test_all_attempts_fail_uses_fallback() {
        let h = harness(
            Some("sk"),
            vec![server_error(), server_error(), server_error()],
            png_bytes,
            CountingApplier::default(),
        );

        let outcome = h.pipeline.run();

        match outcome {
            GenerationOutcome::FallbackDelivered {
                cause: GenerationError::RemoteGenerationFailed { attempts, .. },
                image,
            } => {
                assert_eq!(attempts, 3);
                let decoded = image::load_from_memory(&image.bytes).unwrap();
                assert_eq!((decoded.width(), decoded.height()), (8, 16));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert_eq!(h.generator.calls(), 3);
        assert_eq!(h.sleeper.sleeps(), vec![Duration::from_secs(60); 2]);
    }

    #[test]
    fn test_success_on_second_attempt_delivers_remote() {
        let h =
            harness(Some("sk"), vec![server_error(), url()], png_bytes, CountingApplier::default());

        let outcome = h.pipeline.run();

        match outcome {
            GenerationOutcome::Delivered { image, source_url } => {
                assert_eq!(source_url.as_deref(), Some("https://images.example/x.png"));
                assert_eq!(image::guess_format(&image.bytes).unwrap(), image::ImageFormat::Jpeg);
                assert_eq!(fs::read(&image.current_path).unwrap(), image.bytes);
            }
            other => panic!("expected delivered, got {other:?}"),
        }
        assert_eq!(h.generator.calls(), 2);
        assert_eq!(h.sleeper.sleeps().len(), 1);
    }

    #[test]
    fn test_download_timeout_is_not_retried() {
        let h = harness(Some("sk"), vec![url(), url()], timed_out, CountingApplier::default());

        let outcome = h.pipeline.run();

        assert!(matches!(
            outcome,
            GenerationOutcome::FallbackDelivered {
                cause: GenerationError::DownloadFailed(DownloadError::Timeout(_)),
                ..
            }
        ));
        assert_eq!(h.generator.calls(), 1);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_undecodable_download_falls_back() {
        fn html() -> Result<Vec<u8>, DownloadError> { Ok(b"<html></html>".to_vec()) }
        let h = harness(Some("sk"), vec![url()], html, CountingApplier::default());

        let outcome = h.pipeline.run();

        assert!(matches!(
            outcome,
            GenerationOutcome::FallbackDelivered {
                cause: GenerationError::DownloadFailed(DownloadError::Decode(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_inline_image_skips_download() {
        let inline = encode_jpeg(&RgbImage::from_pixel(3, 3, Rgb([9, 9, 9]))).unwrap();
        let h = harness(
            Some("sk"),
            vec![Ok(GeneratedImage::Inline(inline))],
            png_bytes,
            CountingApplier::default(),
        );

        let outcome = h.pipeline.run();

        assert!(matches!(outcome, GenerationOutcome::Delivered { source_url: None, .. }));
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_apply_failure_is_failed_but_image_is_stored() {
        let h = harness(
            Some("sk"),
            vec![url()],
            png_bytes,
            CountingApplier { fail: true, ..Default::default() },
        );

        let outcome = h.pipeline.run();

        assert!(matches!(outcome, GenerationOutcome::Failed(GenerationError::ApplyFailed(_))));
        assert!(outcome.is_failed());
        assert!(h.pipeline.store().current_exists());
    }

    #[test]
    fn test_persistence_failure_is_failed_and_not_applied() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let applier = Arc::new(CountingApplier::default());
        let pipeline = GenerationPipeline::new(
            Arc::new(InMemorySettingsStore::new(None)),
            ScriptedGenerator::new(vec![]),
            downloader(png_bytes),
            ImageStore::new(blocker.join("images")),
            applier.clone(),
        )
        .with_fallback_size(2, 2);

        let outcome = pipeline.run();

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed(GenerationError::PersistenceFailed(_))
        ));
        assert_eq!(applier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_fallback_size_fails() {
        let h = harness(None, vec![], png_bytes, CountingApplier::default());
        let pipeline = h.pipeline.with_fallback_size(0, 10);

        assert!(matches!(
            pipeline.run(),
            GenerationOutcome::Failed(GenerationError::FallbackFailed(_))
        ));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(GenerationOutcome::Failed(GenerationError::CredentialMissing).label(), "failed");
        assert!(GenerationOutcome::Failed(GenerationError::CredentialMissing).image().is_none());
    }

    #[test]
    fn test_job_report_from_outcome() {
        let h = harness(None, vec![], png_bytes, CountingApplier::default());
        let fallback = h.pipeline.run();
        let report = JobReport::from(&fallback);
        assert!(report.succeeded);
        assert!(report.summary.starts_with("fallback: "));

        let failed =
            JobReport::from(&GenerationOutcome::Failed(GenerationError::CredentialMissing));
        assert!(!failed.succeeded);
        assert!(failed.summary.starts_with("failed: "));
    }
}
