//! JPEG encoding shared by the gradient synthesizer and downloaded images.

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use crate::constants::JPEG_QUALITY;

/// Encodes an RGB image as JPEG at the stored quality.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image (e.g. dimensions above 65535).
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    image.write_with_encoder(encoder)?;
    Ok(buffer)
}

/// Decodes an image in any supported format and re-encodes it as JPEG.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn normalize_to_jpeg(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    encode_jpeg(&decoded.to_rgb8())
}
