//! Request and response bodies of the analysis and storage REST API.
//!
//! The mean endpoint speaks snake_case, the categorized endpoints camelCase.
//! Line positions are integer pixels; fractional echoes are rounded on
//! receipt.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_BLUR_KERNEL_SIZE;
use crate::model::{
    BrightnessMatrix, Category, CategorizedMeanResult, CategoryMeanResult, ImageId, Pixel,
    SelectedCell, deserialize_pixel_lines,
};

/// Body of `POST /calculate-mean-lines/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeanLinesRequest {
    /// Interior vertical line x positions
    pub vertical_lines: Vec<Pixel>,
    /// Interior horizontal line y positions
    pub horizontal_lines: Vec<Pixel>,
}

/// Response of `POST /calculate-mean-lines/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeanLinesResponse {
    /// Whether the computation succeeded
    #[serde(default = "default_true")]
    pub success: bool,
    /// Server message
    #[serde(default)]
    pub message: String,
    /// Mean brightness per cell
    #[serde(default)]
    pub means: BrightnessMatrix,
    /// Image the means belong to
    #[serde(default)]
    pub image_id: ImageId,
    /// Id of the persisted result
    #[serde(default)]
    pub result_id: u64,
    /// Vertical lines the server actually used
    #[serde(default, deserialize_with = "deserialize_optional_pixel_lines")]
    pub vertical_lines: Option<Vec<Pixel>>,
    /// Horizontal lines the server actually used
    #[serde(default, deserialize_with = "deserialize_optional_pixel_lines")]
    pub horizontal_lines: Option<Vec<Pixel>>,
}

impl MeanLinesResponse {
    /// Both echoed line lists, when the server sent them.
    pub fn echoed_lines(&self) -> Option<(&[Pixel], &[Pixel])> {
        match (&self.vertical_lines, &self.horizontal_lines) {
            (Some(v), Some(h)) => Some((v, h)),
            _ => None,
        }
    }
}

/// Body of `POST /calculate-categorized-mean/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedMeanRequest {
    /// Interior vertical line x positions
    pub vertical_lines: Vec<Pixel>,
    /// Interior horizontal line y positions
    pub horizontal_lines: Vec<Pixel>,
    /// Cells assigned to categories
    pub selected_cells: Vec<SelectedCell>,
    /// Categories referenced by the selection
    pub selection_categories: Vec<Category>,
    /// Image the computation is for
    #[serde(rename = "imageID")]
    pub image_id: ImageId,
}

/// Parameters of `POST /gaussian-blur/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurParams {
    /// Kernel size in pixels (odd)
    #[serde(default = "default_kernel_size")]
    pub kernel_size: u32,
    /// Standard deviation along x; `0` lets the server derive it
    #[serde(default)]
    pub sigma_x: f64,
    /// Standard deviation along y; `0` lets the server derive it
    #[serde(default)]
    pub sigma_y: f64,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
            sigma_x: 0.0,
            sigma_y: 0.0,
        }
    }
}

/// Response of `GET /categorized-mean/{id}/result`.
///
/// The stored result is nested one level deeper than a fresh computation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StoredCategorizedResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    image_id: ImageId,
    #[serde(default)]
    result_id: u64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    result: Option<StoredCategorizedBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCategorizedBody {
    #[serde(default)]
    all_cells_mean: f64,
    #[serde(default)]
    category_results: Vec<CategoryMeanResult>,
    #[serde(default)]
    overall_mean: f64,
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    vertical_lines: Vec<Pixel>,
    #[serde(default, deserialize_with = "deserialize_pixel_lines")]
    horizontal_lines: Vec<Pixel>,
    #[serde(default)]
    total_cells: usize,
    #[serde(default)]
    selected_cells_count: usize,
}

impl StoredCategorizedResult {
    /// Flatten into the shape of a fresh computation.
    ///
    /// Returns `None` for an unsuccessful or body-less response.
    pub(crate) fn into_result(self) -> Option<CategorizedMeanResult> {
        if !self.success {
            return None;
        }
        let body = self.result?;
        let created_at = self.created_at.unwrap_or_default();
        Some(CategorizedMeanResult {
            success: true,
            message: format!("Restored result from {}", created_at),
            image_id: self.image_id,
            result_id: self.result_id,
            all_cells_mean: body.all_cells_mean,
            category_results: body.category_results,
            overall_mean: body.overall_mean,
            vertical_lines: body.vertical_lines,
            horizontal_lines: body.horizontal_lines,
            total_cells: body.total_cells,
            selected_cells_count: body.selected_cells_count,
        })
    }
}

/// Form data sent alongside an uploaded image file.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UploadForm<'a> {
    pub title: &'a str,
    pub dataset_id: u64,
    pub description: &'a str,
}

/// Response of `POST /image/upload`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawUploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<UploadData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadData {
    #[serde(default)]
    pub image_id: Option<ImageId>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Render an error response body as a single message.
///
/// FastAPI-style bodies carry either a `detail` string or a list of
/// `{loc, msg}` validation entries. Anything else falls back to the status.
pub fn describe_error_body(status: u16, body: &str) -> String {
    let fallback = || format!("HTTP error! status: {}", status);
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return fallback();
    };
    match parsed.detail {
        Some(serde_json::Value::String(detail)) => detail,
        Some(serde_json::Value::Array(entries)) => {
            let parts: Vec<String> = entries.iter().map(describe_validation_entry).collect();
            format!("Validation error: {}", parts.join("; "))
        }
        _ => parsed.message.unwrap_or_else(fallback),
    }
}

fn describe_validation_entry(entry: &serde_json::Value) -> String {
    let msg = entry
        .get("msg")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| entry.to_string());
    let loc = entry.get("loc").and_then(|l| l.as_array()).map(|parts| {
        parts
            .iter()
            .map(|p| match p {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    });
    match loc {
        Some(loc) if !loc.is_empty() => format!("{}: {}", loc, msg),
        _ => msg,
    }
}

fn default_true() -> bool {
    true
}

fn default_kernel_size() -> u32 {
    DEFAULT_BLUR_KERNEL_SIZE
}

fn deserialize_optional_pixel_lines<'de, D>(deserializer: D) -> Result<Option<Vec<Pixel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<f64>>::deserialize(deserializer)?;
    Ok(values.map(|values| values.into_iter().map(|v| v.round() as Pixel).collect()))
}
