//! Building markup documents from a session's cached state.

use crate::coords;
use crate::error::AnalysisError;
use crate::markup::document::{MarkupDocument, MarkupMetadata};
use crate::model::{Category, ImageId, SelectedCell};
use crate::session::ManualAnalysis;

/// Builds markup documents for analyzed images.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupExporter;

impl MarkupExporter {
    /// Create an exporter.
    pub fn new() -> Self {
        Self
    }

    /// Build a document for one image.
    ///
    /// Needs both images cached and a server result; lines come from the
    /// current state, luminance from the last server result.
    pub fn export(
        &self,
        analysis: &ManualAnalysis,
        image_id: ImageId,
        selected_cells: &[SelectedCell],
        categories: &[Category],
        name: Option<&str>,
    ) -> Result<MarkupDocument, AnalysisError> {
        let state = analysis
            .state(image_id)
            .ok_or(AnalysisError::MissingCachedImage {
                which: "original",
                image_id,
            })?;
        let original_image = state
            .original_image
            .clone()
            .ok_or(AnalysisError::MissingCachedImage {
                which: "original",
                image_id,
            })?;
        let blurred_image = state
            .blurred_image
            .clone()
            .ok_or(AnalysisError::MissingCachedImage {
                which: "blurred",
                image_id,
            })?;
        let result = state
            .last_server_result
            .as_ref()
            .ok_or(AnalysisError::NoBrightnessData { image_id })?;
        let dims = state
            .dimensions
            .ok_or(AnalysisError::DimensionsUnavailable { image_id })?;

        let pixels = coords::interior_pixels(&state.current_lines, dims)?;
        if state.dirty {
            log::warn!(
                "Exporting image {} with lines that differ from its last result",
                image_id
            );
        }

        Ok(MarkupDocument {
            original_image,
            blurred_image: Some(blurred_image),
            metadata: MarkupMetadata {
                luminance: result.brightness_data.clone(),
                vertical_lines: pixels.vertical,
                horizontal_lines: pixels.horizontal,
                selected_cells: selected_cells.to_vec(),
                selection_categories: categories.to_vec(),
                name: name.map(str::to_string),
            },
        })
    }
}
