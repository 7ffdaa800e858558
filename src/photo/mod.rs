//! Photo attachments: downscaling, JPEG re-encoding and the inline
//! data-URL form stored on notes.

mod codec;

pub use codec::{target_dimensions, ImageCodec, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};

use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TripbookError};

const DATA_URL_SEPARATOR: &str = ";base64,";

/// A compressed photo stored inline, as a `data:<mime>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self(format!(
            "data:image/jpeg{}{}",
            DATA_URL_SEPARATOR,
            BASE64_ENGINE.encode(bytes)
        ))
    }

    /// Wrap an already-encoded data URL (e.g. one read back from storage).
    pub fn from_data_url(url: String) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Size of the inline representation, which is what counts against the
    /// storage quota.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let (mime, _) = rest.split_once(DATA_URL_SEPARATOR)?;
        Some(mime)
    }

    /// Decode the base64 payload back to the raw image bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (_, payload) = self
            .0
            .split_once(DATA_URL_SEPARATOR)
            .ok_or_else(|| TripbookError::ImageDecode("not a base64 data URL".to_string()))?;
        BASE64_ENGINE
            .decode(payload)
            .map_err(|e| TripbookError::ImageDecode(format!("invalid base64 payload: {}", e)))
    }

    /// Pixel dimensions of the stored image.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let bytes = self.to_bytes()?;
        let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| TripbookError::ImageDecode(e.to_string()))?;
        reader
            .into_dimensions()
            .map_err(|e| TripbookError::ImageDecode(e.to_string()))
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_shape() {
        let image = EncodedImage::from_jpeg_bytes(&[0xff, 0xd8, 0xff]);
        assert_eq!(image.as_str(), "data:image/jpeg;base64,/9j/");
        assert_eq!(image.mime_type(), Some("image/jpeg"));
        assert_eq!(image.to_bytes().unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_to_bytes_rejects_non_data_url() {
        let image = EncodedImage::from_data_url("https://example.com/a.jpg".to_string());
        assert!(matches!(image.to_bytes(), Err(TripbookError::ImageDecode(_))));
        assert_eq!(image.mime_type(), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let image = EncodedImage::from_data_url("data:image/jpeg;base64,AAAA".to_string());
        assert_eq!(
            serde_json::to_string(&image).unwrap(),
            "\"data:image/jpeg;base64,AAAA\""
        );
    }
}
