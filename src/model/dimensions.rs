//! Pixel extents of an analysed image.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::model::Orientation;

/// Width and height of an image in pixels.
///
/// Captured once per image (from the decoded original) and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageDimensions {
    /// Create validated dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, AnalysisError> {
        let dims = Self { width, height };
        dims.validate()?;
        Ok(dims)
    }

    /// Fail with [`AnalysisError::InvalidDimensions`] when an extent is zero.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.width == 0 || self.height == 0 {
            return Err(AnalysisError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// The extent along which lines of the given orientation are positioned.
    ///
    /// Vertical lines sit at an x coordinate, horizontal lines at a y coordinate.
    pub fn extent(&self, orientation: Orientation) -> u32 {
        match orientation {
            Orientation::Vertical => self.width,
            Orientation::Horizontal => self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_extent_rejected() {
        assert!(ImageDimensions::new(0, 10).is_err());
        assert!(ImageDimensions::new(10, 0).is_err());
        assert!(ImageDimensions::new(1, 1).is_ok());
    }

    #[test]
    fn test_extent_by_orientation() {
        let dims = ImageDimensions::new(640, 480).unwrap();
        assert_eq!(dims.extent(Orientation::Vertical), 640);
        assert_eq!(dims.extent(Orientation::Horizontal), 480);
    }
}
