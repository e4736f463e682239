//! OpenAI Images API client.
//!
//! Sends `POST {base_url}/images/generations` with a bearer credential and
//! reads the first entry of the returned `data` array. The same HTTP client is
//! used to download the generated image.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{
    DownloadError, GeneratedImage, GenerationRequest, GeneratorError, ImageDownloader,
    ImageGenerator,
};
use crate::config::GeneratorConfig;

/// Longest error body kept in `GeneratorError::Status`.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesGenerateResponse {
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

/// Blocking client for an OpenAI-compatible image generation API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    model: String,
    size: String,
}

impl OpenAiClient {
    /// Creates a client from the generator configuration.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Http` if the TLS backend cannot be initialized.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("daywall/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeneratorError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
        })
    }

    fn endpoint(&self) -> String { format!("{}/images/generations", self.base_url) }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

impl ImageGenerator for OpenAiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, GeneratorError> {
        let body = ImagesGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            n: 1,
            size: &self.size,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&request.credential)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body: truncate_body(text),
            });
        }

        let parsed: ImagesGenerateResponse =
            response.json().map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let first = parsed.data.into_iter().next().ok_or(GeneratorError::EmptyResponse)?;

        if let Some(revised) = first.revised_prompt.as_deref() {
            tracing::debug!(revised_prompt = revised, "generator revised the prompt");
        }

        if let Some(url) = first.url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(created = ?parsed.created, "generator returned image url");
            return Ok(GeneratedImage::Url(url));
        }

        if let Some(b64) = first.b64_json {
            let bytes = general_purpose::STANDARD
                .decode(b64.trim())
                .map_err(|e| GeneratorError::InvalidResponse(format!("bad b64_json: {e}")))?;
            return Ok(GeneratedImage::Inline(bytes));
        }

        Err(GeneratorError::InvalidResponse("image entry has neither url nor b64_json".to_string()))
    }
}

impl ImageDownloader for OpenAiClient {
    fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, DownloadError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                DownloadError::Timeout(timeout)
            } else {
                DownloadError::Http(e.to_string())
            }
        };

        let response = self.http.get(url).timeout(timeout).send().map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let bytes = response.bytes().map_err(classify)?;
        if bytes.is_empty() {
            return Err(DownloadError::Empty);
        }
        Ok(bytes.to_vec())
    }
}
