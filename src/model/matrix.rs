//! Per-cell brightness matrix produced by the analysis service.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Row-major matrix of per-cell mean brightness.
///
/// Invalid cells (`null` on the wire, or NaN) are stored as NaN and skipped by
/// every aggregate. Ragged input rows are padded with invalid cells up to the
/// widest row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<Option<f64>>>", into = "Vec<Vec<Option<f64>>>")]
pub struct BrightnessMatrix {
    cells: Array2<f64>,
}

impl BrightnessMatrix {
    /// Build a matrix from nullable rows.
    pub fn from_rows(rows: Vec<Vec<Option<f64>>>) -> Self {
        let n_rows = rows.len();
        let n_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
            rows[r].get(c).copied().flatten().unwrap_or(f64::NAN)
        });
        Self { cells }
    }

    /// Build a matrix where every value is present (NaN still counts as invalid).
    pub fn from_values(rows: Vec<Vec<f64>>) -> Self {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(Some).collect())
                .collect(),
        )
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Check if the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether a raw value counts towards aggregates.
    pub fn is_valid(value: f64) -> bool {
        !value.is_nan()
    }

    /// Valid value at a cell, `None` for invalid or out-of-range cells.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells
            .get((row, col))
            .copied()
            .filter(|v| Self::is_valid(*v))
    }

    /// Valid values of one row. Panics if `row` is out of range.
    pub fn row_values(&self, row: usize) -> impl Iterator<Item = f64> + '_ {
        self.cells
            .index_axis(Axis(0), row)
            .into_iter()
            .copied()
            .filter(|v| Self::is_valid(*v))
    }

    /// Valid values of one column. Panics if `col` is out of range.
    pub fn col_values(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.cells
            .index_axis(Axis(1), col)
            .into_iter()
            .copied()
            .filter(|v| Self::is_valid(*v))
    }

    /// All valid values, row by row.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().copied().filter(|v| Self::is_valid(*v))
    }

    /// Nullable rows, as sent on the wire.
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        self.cells
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|v| Some(*v).filter(|v| Self::is_valid(*v)))
                    .collect()
            })
            .collect()
    }
}

impl Default for BrightnessMatrix {
    fn default() -> Self {
        Self {
            cells: Array2::from_elem((0, 0), f64::NAN),
        }
    }
}

/// Invalid cells compare equal to each other.
impl PartialEq for BrightnessMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.cells.dim() == other.cells.dim() && self.to_rows() == other.to_rows()
    }
}

impl From<Vec<Vec<Option<f64>>>> for BrightnessMatrix {
    fn from(rows: Vec<Vec<Option<f64>>>) -> Self {
        Self::from_rows(rows)
    }
}

impl From<BrightnessMatrix> for Vec<Vec<Option<f64>>> {
    fn from(matrix: BrightnessMatrix) -> Self {
        matrix.to_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nulls_and_nan_are_invalid() {
        let m: BrightnessMatrix =
            serde_json::from_str("[[1.0, null], [2.0, 3.0]]").unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(1, 1), Some(3.0));

        let m = BrightnessMatrix::from_values(vec![vec![f64::NAN, 4.0]]);
        assert_eq!(m.valid_values().collect::<Vec<_>>(), vec![4.0]);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let m = BrightnessMatrix::from_rows(vec![vec![Some(1.0)], vec![Some(2.0), Some(3.0)]]);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.col_values(1).collect::<Vec<_>>(), vec![3.0]);
    }

    #[test]
    fn test_out_of_range_get() {
        let m = BrightnessMatrix::from_values(vec![vec![1.0]]);
        assert_eq!(m.get(5, 0), None);
        assert_eq!(m.get(0, 5), None);
    }

    #[test]
    fn test_serializes_invalid_as_null() {
        let m = BrightnessMatrix::from_rows(vec![vec![Some(1.5), None]]);
        assert_eq!(serde_json::to_string(&m).unwrap(), "[[1.5,null]]");
    }

    #[test]
    fn test_empty() {
        let m: BrightnessMatrix = serde_json::from_str("[]").unwrap();
        assert!(m.is_empty());
        assert_eq!(m.rows(), 0);
        assert_eq!(m.valid_values().count(), 0);
    }

    #[test]
    fn test_invalid_cells_compare_equal() {
        let a = BrightnessMatrix::from_rows(vec![vec![Some(1.0), None]]);
        let b = BrightnessMatrix::from_values(vec![vec![1.0, f64::NAN]]);
        assert_eq!(a, b);
        assert_ne!(a, BrightnessMatrix::from_values(vec![vec![1.0, 2.0]]));
    }
}
