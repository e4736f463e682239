//! Fallback wallpaper: a vertical two-color gradient with random endpoints.
//!
//! Each row `y` is painted `start + (end - start) * (y / height)` per channel,
//! truncated toward zero, so row 0 is exactly `start` and the last row
//! approaches `end`.

use image::{Rgb, RgbImage};
use rand::Rng;
use thiserror::Error;

use super::encode::encode_jpeg;

/// Errors that can occur while synthesizing a gradient.
#[derive(Debug, Error)]
pub enum GradientError {
    /// Width or height is zero.
    #[error("gradient dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    /// The JPEG encoder rejected the image.
    #[error("failed to encode gradient: {0}")]
    Encode(#[from] image::ImageError),
}

/// Picks two random endpoint colors.
pub fn random_endpoints<R: Rng + ?Sized>(rng: &mut R) -> (Rgb<u8>, Rgb<u8>) {
    let start = Rgb([rng.random(), rng.random(), rng.random()]);
    let end = Rgb([rng.random(), rng.random(), rng.random()]);
    (start, end)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn lerp_channel(start: u8, end: u8, ratio: f32) -> u8 {
    let start = f32::from(start);
    let end = f32::from(end);
    // Bounded by the endpoints, so the cast only drops the fraction.
    (start + (end - start) * ratio) as u8
}

/// Renders the gradient bitmap between two colors.
///
/// # Errors
///
/// Returns `GradientError::EmptyDimensions` if either dimension is zero.
#[allow(clippy::cast_precision_loss)]
pub fn render(
    width: u32,
    height: u32,
    start: Rgb<u8>,
    end: Rgb<u8>,
) -> Result<RgbImage, GradientError> {
    if width == 0 || height == 0 {
        return Err(GradientError::EmptyDimensions { width, height });
    }

    let mut img = RgbImage::new(width, height);
    for (y, row) in img.enumerate_rows_mut() {
        let ratio = y as f32 / height as f32;
        let color = Rgb([
            lerp_channel(start[0], end[0], ratio),
            lerp_channel(start[1], end[1], ratio),
            lerp_channel(start[2], end[2], ratio),
        ]);
        for (_, _, pixel) in row {
            *pixel = color;
        }
    }
    Ok(img)
}

/// Synthesizes a random gradient and returns it as JPEG bytes.
///
/// # Errors
///
/// Returns `GradientError::EmptyDimensions` for a zero dimension, before any
/// random values are drawn, or `GradientError::Encode` if encoding fails.
pub fn synthesize<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    rng: &mut R,
) -> Result<Vec<u8>, GradientError> {
    if width == 0 || height == 0 {
        return Err(GradientError::EmptyDimensions { width, height });
    }

    let (start, end) = random_endpoints(rng);
    tracing::debug!(width, height, ?start, ?end, "synthesizing fallback gradient");
    let img = render(width, height, start, end)?;
    Ok(encode_jpeg(&img)?)
}
