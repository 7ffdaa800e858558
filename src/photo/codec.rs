use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tracing::debug;

use super::EncodedImage;
use crate::error::{Result, TripbookError};

pub const DEFAULT_MAX_WIDTH: u32 = 800;
pub const DEFAULT_QUALITY: f32 = 0.7;

/// Downscales and re-encodes user photos so notes stay small.
///
/// Stateless and cheap to clone; any number of encodes may run at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCodec {
    max_width: u32,
    quality: f32,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ImageCodec {
    /// `quality` is in (0, 1], as for a canvas JPEG export.
    pub fn new(max_width: u32, quality: f32) -> Result<Self> {
        if max_width == 0 {
            return Err(TripbookError::Config(
                "image max width must be positive".to_string(),
            ));
        }
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(TripbookError::Config(format!(
                "image quality must be in (0, 1], got {}",
                quality
            )));
        }
        Ok(Self { max_width, quality })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Decode `raw`, shrink it to at most `max_width` pixels wide and
    /// re-encode it as an inline JPEG.
    ///
    /// Decoding and encoding each run on the blocking pool; nothing is
    /// shared between calls. Fails with `ImageDecode` for empty or
    /// undecodable input.
    pub async fn encode(&self, raw: Vec<u8>) -> Result<EncodedImage> {
        if raw.is_empty() {
            return Err(TripbookError::ImageDecode("no image data supplied".to_string()));
        }

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&raw))
            .await
            .map_err(|e| TripbookError::ImageDecode(e.to_string()))?
            .map_err(|e| TripbookError::ImageDecode(e.to_string()))?;

        let codec = *self;
        tokio::task::spawn_blocking(move || codec.encode_decoded(decoded))
            .await
            .map_err(|e| TripbookError::ImageEncode(e.to_string()))?
    }

    fn encode_decoded(&self, decoded: DynamicImage) -> Result<EncodedImage> {
        let (width, height) = (decoded.width(), decoded.height());
        let (target_width, target_height) = target_dimensions(width, height, self.max_width);

        // JPEG has no alpha channel
        let rgb = decoded.into_rgb8();
        let scaled: RgbImage = if (target_width, target_height) == (width, height) {
            rgb
        } else {
            imageops::resize(&rgb, target_width, target_height, FilterType::Triangle)
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality_percent())
            .encode_image(&scaled)
            .map_err(|e| TripbookError::ImageEncode(e.to_string()))?;

        debug!(
            width,
            height,
            target_width,
            target_height,
            bytes = bytes.len(),
            "re-encoded photo"
        );
        Ok(EncodedImage::from_jpeg_bytes(&bytes))
    }

    fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Output size for an image of `width` x `height`: scaled by
/// `min(1, max_width / width)`, never upsampled, never collapsing to zero.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scale = max_width as f64 / width as f64;
    let scaled_height = (height as f64 * scale).round().max(1.0) as u32;
    (max_width, scaled_height)
}
