//! Category data model for grouping grid cells.

use serde::{Deserialize, Serialize};

/// A user-defined group of grid cells with a name and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier for the category
    pub id: String,
    /// Display name of the category
    pub name: String,
    /// CSS color string (e.g. `#ff0000`)
    pub color: String,
}

impl Category {
    /// Create a new category with the given ID, name, and color.
    pub fn new(id: &str, name: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

/// A grid cell assigned to a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCell {
    /// Grid row (0-based, top to bottom)
    pub row: usize,
    /// Grid column (0-based, left to right)
    pub col: usize,
    /// Category the cell belongs to
    pub category_id: String,
}

impl SelectedCell {
    /// Create a new cell selection.
    pub fn new(row: usize, col: usize, category_id: &str) -> Self {
        Self {
            row,
            col,
            category_id: category_id.to_string(),
        }
    }

    /// Position of the cell without its category.
    pub fn position(&self) -> CellPosition {
        CellPosition {
            row: self.row,
            col: self.col,
        }
    }
}

/// Row/column position of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPosition {
    /// Grid row
    pub row: usize,
    /// Grid column
    pub col: usize,
}

/// Aggregated brightness of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMeanResult {
    /// Category id
    pub category_id: String,
    /// Category display name
    #[serde(default)]
    pub category_name: String,
    /// Category color
    #[serde(default)]
    pub color: String,
    /// Mean over the valid values of all member cells (0 when there are none)
    #[serde(rename = "meanValue")]
    pub mean: f64,
    /// Number of member cells inside the grid
    pub cell_count: usize,
    /// Member cells inside the grid
    #[serde(default)]
    pub cells: Vec<CellPosition>,
    /// Mean per grid row that contains member cells, in row order
    #[serde(default)]
    pub row_means: Vec<Option<f64>>,
    /// Mean of the present row means
    #[serde(default)]
    pub row_means_average: Option<f64>,
}

impl CategoryMeanResult {
    /// Result for a category without any member cells.
    pub fn empty(category: &Category) -> Self {
        Self {
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            color: category.color.clone(),
            mean: 0.0,
            cell_count: 0,
            cells: Vec::new(),
            row_means: Vec::new(),
            row_means_average: None,
        }
    }
}
