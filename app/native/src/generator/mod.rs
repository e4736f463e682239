//! Remote image generation.
//!
//! [`ImageGenerator`] turns a prompt into an image location (or inline image
//! data) and [`ImageDownloader`] fetches the bytes behind a location. Both are
//! traits so the pipeline can be driven by fakes or by the
//! [`openai::OpenAiClient`] implementation.

pub mod openai;

use std::time::Duration;

use thiserror::Error;

pub use openai::OpenAiClient;

/// Everything the generator needs for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub credential: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, credential: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), credential: credential.into() }
    }
}

/// A successful generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// The image must be downloaded from this URL.
    Url(String),
    /// The service returned the image bytes inline.
    Inline(Vec<u8>),
}

/// Errors returned by a single generation attempt. All of them are retryable.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Http(String),
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body was not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The response contained no images.
    #[error("response contained no images")]
    EmptyResponse,
}

/// Errors returned while downloading a generated image. Never retried.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The download did not finish within the allotted time.
    #[error("download timed out after {0:?}")]
    Timeout(Duration),
    /// The request could not be sent or the body could not be read.
    #[error("download failed: {0}")]
    Http(String),
    /// The server answered with a non-success status.
    #[error("download returned status {0}")]
    Status(u16),
    /// The server returned an empty body.
    #[error("downloaded image is empty")]
    Empty,
    /// The bytes are not a decodable image.
    #[error("downloaded data is not an image: {0}")]
    Decode(String),
}

/// Produces an image for a prompt.
pub trait ImageGenerator: Send + Sync {
    /// Performs one generation attempt.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError` for any failure; the caller decides whether to retry.
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GeneratorError>;
}

/// Fetches the bytes behind an image URL.
pub trait ImageDownloader: Send + Sync {
    /// Downloads `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on timeout, transport failure, or a bad status.
    fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, DownloadError>;
}
