//! Encoded image payloads and their `data:` URL form.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::AnalysisError;
use crate::model::ImageDimensions;

/// An encoded (PNG, JPEG, ...) image with its MIME type.
///
/// Images are cached and transferred in this form; pixels are only ever
/// looked at to read the dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type, e.g. `image/png`
    pub mime: String,
    /// Encoded file bytes
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Wrap encoded bytes.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Parse and decode a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self, AnalysisError> {
        let (header, payload) = url
            .split_once(',')
            .ok_or_else(|| AnalysisError::malformed("invalid data URL: missing ','"))?;
        let meta = header
            .strip_prefix("data:")
            .ok_or_else(|| AnalysisError::malformed("invalid data URL: missing 'data:' prefix"))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| AnalysisError::malformed("invalid data URL: payload is not base64"))?;
        if mime.is_empty() {
            return Err(AnalysisError::malformed(
                "invalid data URL: could not determine MIME type",
            ));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| AnalysisError::malformed(format!("invalid base64 payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AnalysisError::malformed("data URL has an empty payload"));
        }
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    /// Encode as a base64 data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Check the magic bytes for a format the `image` crate can decode.
    pub fn has_known_format(&self) -> bool {
        image::guess_format(&self.bytes).is_ok()
    }

    /// Read the pixel dimensions from the image header.
    pub fn probe_dimensions(&self) -> Result<ImageDimensions, AnalysisError> {
        let (width, height) = image::ImageReader::new(Cursor::new(self.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| AnalysisError::dimension_probe(e.to_string()))?
            .into_dimensions()
            .map_err(|e| AnalysisError::dimension_probe(e.to_string()))?;
        ImageDimensions::new(width, height)
            .map_err(|e| AnalysisError::dimension_probe(e.to_string()))
    }
}
