//! The markup document format.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::model::{
    BrightnessMatrix, Category, EncodedImage, Pixel, SelectedCell, deserialize_pixel_lines,
};

/// Analysis data stored next to the images of a markup document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupMetadata {
    /// Per-cell mean brightness at export time
    #[serde(default)]
    pub luminance: BrightnessMatrix,
    /// Interior vertical line x positions in pixels
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    pub vertical_lines: Vec<Pixel>,
    /// Interior horizontal line y positions in pixels
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    pub horizontal_lines: Vec<Pixel>,
    /// Cells assigned to categories
    #[serde(default)]
    pub selected_cells: Vec<SelectedCell>,
    /// Categories referenced by the selection
    #[serde(default)]
    pub selection_categories: Vec<Category>,
    /// File name to upload the image under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A markup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupDocument {
    /// Original image as a data URL
    pub original_image: String,
    /// Blurred image as a data URL
    #[serde(default)]
    pub blurred_image: Option<String>,
    /// Lines, selection and luminance
    #[serde(default)]
    pub metadata: MarkupMetadata,
}

impl MarkupDocument {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        serde_json::from_str(json)
            .map_err(|e| AnalysisError::malformed(format!("Invalid markup JSON: {}", e)))
    }

    /// Parse a document from raw file bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AnalysisError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AnalysisError::malformed(format!("Invalid markup JSON: {}", e)))
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode the embedded original image.
    ///
    /// Fails unless the payload is valid base64 of a recognizable image
    /// format.
    pub fn original(&self) -> Result<EncodedImage, AnalysisError> {
        let image = EncodedImage::from_data_url(&self.original_image)?;
        if !image.has_known_format() {
            return Err(AnalysisError::malformed(
                "Embedded original image has an unrecognized format",
            ));
        }
        Ok(image)
    }

    /// Name to upload the image under: the metadata name, or a timestamped
    /// fallback.
    pub fn file_name(&self) -> String {
        match self.metadata.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let millis = web_time::SystemTime::now()
                    .duration_since(web_time::UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or(0);
                format!("imported_{}.png", millis)
            }
        }
    }
}

/// A file name without its last extension.
pub(crate) fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
