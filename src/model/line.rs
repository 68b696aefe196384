//! Partition lines drawn over an image.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};

/// A line position in image pixel space.
pub type Pixel = i64;

/// Orientation of a partition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Vertical line, positioned along the x axis
    Vertical,
    /// Horizontal line, positioned along the y axis
    Horizontal,
}

impl Orientation {
    /// Short prefix used when generating line ids.
    pub fn prefix(self) -> &'static str {
        match self {
            Orientation::Vertical => "v",
            Orientation::Horizontal => "h",
        }
    }
}

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

fn next_line_id(orientation: Orientation) -> String {
    let seq = NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", orientation.prefix(), seq)
}

/// A partition line in normalized `[0, 1]` coordinates.
///
/// Only one axis is meaningful: `relative_x` for vertical lines,
/// `relative_y` for horizontal lines. The other is kept at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Identifier, unique within the process for generated lines
    pub id: String,
    /// Position as a fraction of the image width
    pub relative_x: f64,
    /// Position as a fraction of the image height
    pub relative_y: f64,
}

impl Line {
    /// Create a vertical line with a fresh id.
    pub fn vertical(relative_x: f64) -> Self {
        Self {
            id: next_line_id(Orientation::Vertical),
            relative_x,
            relative_y: 0.0,
        }
    }

    /// Create a horizontal line with a fresh id.
    pub fn horizontal(relative_y: f64) -> Self {
        Self {
            id: next_line_id(Orientation::Horizontal),
            relative_x: 0.0,
            relative_y,
        }
    }

    /// Create a line of the given orientation with a fresh id.
    pub fn with_orientation(orientation: Orientation, relative: f64) -> Self {
        match orientation {
            Orientation::Vertical => Self::vertical(relative),
            Orientation::Horizontal => Self::horizontal(relative),
        }
    }

    /// The meaningful coordinate for the given orientation.
    pub fn position(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.relative_x,
            Orientation::Horizontal => self.relative_y,
        }
    }
}

/// The partition configuration of one image.
///
/// Always replaced as a whole, never edited field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSet {
    /// Horizontal lines (row separators)
    pub horizontal: Vec<Line>,
    /// Vertical lines (column separators)
    pub vertical: Vec<Line>,
}

impl LineSet {
    /// Create a line set from explicit lines.
    pub fn new(horizontal: Vec<Line>, vertical: Vec<Line>) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Create a line set from relative positions, generating fresh ids.
    pub fn from_fractions(vertical: &[f64], horizontal: &[f64]) -> Self {
        Self {
            horizontal: horizontal.iter().map(|&y| Line::horizontal(y)).collect(),
            vertical: vertical.iter().map(|&x| Line::vertical(x)).collect(),
        }
    }

    /// Lines of one orientation.
    pub fn lines(&self, orientation: Orientation) -> &[Line] {
        match orientation {
            Orientation::Vertical => &self.vertical,
            Orientation::Horizontal => &self.horizontal,
        }
    }

    /// Check if there are no lines at all.
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    /// Check if both orientations have at least one line.
    pub fn is_configured(&self) -> bool {
        !self.horizontal.is_empty() && !self.vertical.is_empty()
    }
}

/// Deserialize pixel line positions, rounding any fractional values the
/// server sends to the nearest integer pixel.
pub(crate) fn deserialize_pixel_lines<'de, D>(deserializer: D) -> Result<Vec<Pixel>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<f64>::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.round() as Pixel).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Echo {
        #[serde(deserialize_with = "deserialize_pixel_lines")]
        lines: Vec<Pixel>,
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Line::vertical(0.5);
        let b = Line::vertical(0.5);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("v-"));
        assert!(Line::horizontal(0.5).id.starts_with("h-"));
    }

    #[test]
    fn test_position_by_orientation() {
        let line = Line::vertical(0.25);
        assert_eq!(line.position(Orientation::Vertical), 0.25);
        assert_eq!(line.position(Orientation::Horizontal), 0.0);
    }

    #[test]
    fn test_line_json_field_names() {
        let json = r#"{"id":"v-1","relativeX":0.5,"relativeY":0}"#;
        let line: Line = serde_json::from_str(json).unwrap();
        assert_eq!(line.relative_x, 0.5);
    }

    #[test]
    fn test_pixel_lines_are_rounded() {
        let echo: Echo = serde_json::from_str(r#"{"lines":[0, 24.6, 50, 74.4]}"#).unwrap();
        assert_eq!(echo.lines, vec![0, 25, 50, 74]);
    }

    #[test]
    fn test_is_configured() {
        assert!(!LineSet::default().is_configured());
        assert!(!LineSet::from_fractions(&[0.5], &[]).is_configured());
        assert!(LineSet::from_fractions(&[0.5], &[0.5]).is_configured());
    }
}
