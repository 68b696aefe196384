//! Persisted analysis results as returned by the analysis service.

use serde::{Deserialize, Serialize};

use crate::model::{
    BrightnessMatrix, CategoryMeanResult, ImageId, Pixel, deserialize_pixel_lines,
};

/// Line configuration a result was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualParameters {
    /// Image the lines belong to
    pub image_id: ImageId,
    /// Horizontal line y positions in pixels
    #[serde(deserialize_with = "deserialize_pixel_lines")]
    pub horizontal_lines: Vec<Pixel>,
    /// Vertical line x positions in pixels
    #[serde(deserialize_with = "deserialize_pixel_lines")]
    pub vertical_lines: Vec<Pixel>,
    /// Image width in pixels
    pub image_width: u32,
    /// Image height in pixels
    pub image_height: u32,
}

/// The last mean computation persisted by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualResult {
    /// Result id
    pub id: u64,
    /// Image the result belongs to
    pub image_id: ImageId,
    /// Lines and dimensions the result was computed against
    pub parameters: ManualParameters,
    /// Mean brightness per grid cell
    pub brightness_data: BrightnessMatrix,
    /// Server creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Server update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Result of a categorized mean computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedMeanResult {
    /// Whether the server reported success
    #[serde(default = "default_success")]
    pub success: bool,
    /// Server message
    #[serde(default)]
    pub message: String,
    /// Image the result belongs to
    pub image_id: ImageId,
    /// Result id
    pub result_id: u64,
    /// Mean over all cells
    #[serde(default)]
    pub all_cells_mean: f64,
    /// Per-category aggregates
    #[serde(default)]
    pub category_results: Vec<CategoryMeanResult>,
    /// Overall mean as computed by the server
    #[serde(default)]
    pub overall_mean: f64,
    /// Echoed vertical lines
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    pub vertical_lines: Vec<Pixel>,
    /// Echoed horizontal lines
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    pub horizontal_lines: Vec<Pixel>,
    /// Number of grid cells
    #[serde(default)]
    pub total_cells: usize,
    /// Number of selected cells
    #[serde(default)]
    pub selected_cells_count: usize,
}

fn default_success() -> bool {
    true
}
