//! Grid geometry and brightness aggregation.
//!
//! The grid is defined by the sorted pixel lines of a [`LineSet`]; the
//! brightness values come from the analysis service as a [`BrightnessMatrix`].
//! Aggregates skip invalid cells and never fail: a row, column or category
//! without any valid value aggregates to `0`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::constants::{DEFAULT_X_BLOCK_SIZE, DEFAULT_Y_BLOCK_SIZE};
use crate::coords;
use crate::error::AnalysisError;
use crate::model::{
    BrightnessMatrix, Category, CategoryMeanResult, CellPosition, ImageDimensions, LineSet,
    SelectedCell,
};

/// Pixel rectangle of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellRect {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

/// Approximate cell size used to lay out result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellBlockSize {
    /// Cell width in pixels
    pub x_block: u32,
    /// Cell height in pixels
    pub y_block: u32,
}

impl Default for CellBlockSize {
    fn default() -> Self {
        Self {
            x_block: DEFAULT_X_BLOCK_SIZE,
            y_block: DEFAULT_Y_BLOCK_SIZE,
        }
    }
}

/// Row, column and overall means of a brightness matrix.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    /// The per-cell means the summary was computed from
    pub cell_means: BrightnessMatrix,
    /// Mean per row
    pub row_means: Vec<f64>,
    /// Mean per column
    pub col_means: Vec<f64>,
    /// Mean over all valid cells
    pub overall_mean: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Grid shape as `(rows, cols)`: one more than the line count per orientation.
pub fn grid_shape(lines: &LineSet) -> (usize, usize) {
    (lines.horizontal.len() + 1, lines.vertical.len() + 1)
}

/// Pixel rectangles of every cell, row-major.
///
/// Presentation helper; aggregation never looks at cell geometry.
pub fn cell_coordinates(
    lines: &LineSet,
    dims: ImageDimensions,
) -> Result<Vec<Vec<CellRect>>, AnalysisError> {
    let px = coords::to_pixels(lines, dims)?;
    let cells = px
        .horizontal
        .windows(2)
        .map(|ys| {
            px.vertical
                .windows(2)
                .map(|xs| CellRect {
                    x: xs[0],
                    y: ys[0],
                    width: xs[1] - xs[0],
                    height: ys[1] - ys[0],
                })
                .collect()
        })
        .collect();
    Ok(cells)
}

/// Average cell size for a line configuration.
pub fn cell_block_size(lines: &LineSet, dims: ImageDimensions) -> CellBlockSize {
    let (rows, cols) = grid_shape(lines);
    CellBlockSize {
        x_block: (f64::from(dims.width) / cols as f64).round() as u32,
        y_block: (f64::from(dims.height) / rows as f64).round() as u32,
    }
}

/// Mean of the valid values in each row.
pub fn aggregate_rows(matrix: &BrightnessMatrix) -> Vec<f64> {
    (0..matrix.rows())
        .map(|row| mean(matrix.row_values(row)).unwrap_or(0.0))
        .collect()
}

/// Mean of the valid values in each column.
pub fn aggregate_columns(matrix: &BrightnessMatrix) -> Vec<f64> {
    (0..matrix.cols())
        .map(|col| mean(matrix.col_values(col)).unwrap_or(0.0))
        .collect()
}

/// Mean of every valid cell in the matrix.
///
/// This weights cells equally. It is not the mean of [`aggregate_rows`],
/// which would over-weight cells in rows with many invalid entries.
pub fn aggregate_overall(matrix: &BrightnessMatrix) -> f64 {
    mean(matrix.valid_values()).unwrap_or(0.0)
}

/// Per-category aggregates.
///
/// Selections outside the matrix (for example after the grid was resized)
/// and selections for unknown categories are skipped. Results come back in
/// the order of `categories`.
pub fn aggregate_by_category(
    matrix: &BrightnessMatrix,
    selected: &[SelectedCell],
    categories: &[Category],
) -> Vec<CategoryMeanResult> {
    let mut members: BTreeMap<&str, BTreeSet<CellPosition>> = BTreeMap::new();
    let mut skipped = 0usize;
    for cell in selected {
        if cell.row >= matrix.rows() || cell.col >= matrix.cols() {
            skipped += 1;
            continue;
        }
        members
            .entry(cell.category_id.as_str())
            .or_default()
            .insert(cell.position());
    }
    if skipped > 0 {
        log::debug!(
            "Skipped {} selected cells outside the {}x{} grid",
            skipped,
            matrix.rows(),
            matrix.cols()
        );
    }

    categories
        .iter()
        .map(|category| match members.get(category.id.as_str()) {
            Some(cells) if !cells.is_empty() => category_result(matrix, category, cells),
            _ => CategoryMeanResult::empty(category),
        })
        .collect()
}

fn category_result(
    matrix: &BrightnessMatrix,
    category: &Category,
    cells: &BTreeSet<CellPosition>,
) -> CategoryMeanResult {
    let value_at = |p: &CellPosition| matrix.get(p.row, p.col);

    let mut by_row: BTreeMap<usize, Vec<&CellPosition>> = BTreeMap::new();
    for cell in cells {
        by_row.entry(cell.row).or_default().push(cell);
    }
    let row_means: Vec<Option<f64>> = by_row
        .values()
        .map(|row_cells| mean(row_cells.iter().filter_map(|p| value_at(*p))))
        .collect();

    CategoryMeanResult {
        category_id: category.id.clone(),
        category_name: category.name.clone(),
        color: category.color.clone(),
        mean: mean(cells.iter().filter_map(value_at)).unwrap_or(0.0),
        cell_count: cells.len(),
        cells: cells.iter().copied().collect(),
        row_means_average: mean(row_means.iter().flatten().copied()),
        row_means,
    }
}

/// Row, column and overall means of a matrix.
pub fn summarize(matrix: &BrightnessMatrix) -> GridSummary {
    GridSummary {
        cell_means: matrix.clone(),
        row_means: aggregate_rows(matrix),
        col_means: aggregate_columns(matrix),
        overall_mean: aggregate_overall(matrix),
    }
}
