//! Conversion between normalized line positions and pixel positions.
//!
//! Lines are edited in relative `[0, 1]` space so they survive display
//! scaling; the analysis service works in integer pixels. Conversion rounds
//! to the nearest pixel, so already-integer pixel positions round-trip
//! exactly through relative space.
//!
//! The two image boundaries (`0` and the extent) are part of the pixel grid
//! but are never interior lines: [`is_interior`] is the one place that rule
//! lives.

use crate::error::AnalysisError;
use crate::model::{ImageDimensions, Line, LineSet, Orientation, Pixel};

/// Pixel positions of both line orientations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelLines {
    /// Vertical line x positions
    pub vertical: Vec<Pixel>,
    /// Horizontal line y positions
    pub horizontal: Vec<Pixel>,
}

impl PixelLines {
    /// Create pixel lines from both orientations.
    pub fn new(vertical: Vec<Pixel>, horizontal: Vec<Pixel>) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    /// Positions of one orientation.
    pub fn get(&self, orientation: Orientation) -> &[Pixel] {
        match orientation {
            Orientation::Vertical => &self.vertical,
            Orientation::Horizontal => &self.horizontal,
        }
    }
}

/// Whether a pixel position lies strictly inside `(0, extent)`.
pub fn is_interior(value: Pixel, extent: u32) -> bool {
    value > 0 && value < Pixel::from(extent)
}

/// Keep only the interior positions, sorted ascending and duplicate-free.
pub fn interior(values: &[Pixel], extent: u32) -> Vec<Pixel> {
    let mut kept: Vec<Pixel> = values
        .iter()
        .copied()
        .filter(|&v| is_interior(v, extent))
        .collect();
    kept.sort_unstable();
    kept.dedup();
    kept
}

/// Scale a relative position to the nearest pixel.
pub fn relative_to_pixel(relative: f64, extent: u32) -> Pixel {
    (relative * f64::from(extent)).round() as Pixel
}

fn axis_to_pixels(lines: &[Line], orientation: Orientation, extent: u32) -> Vec<Pixel> {
    let mut pixels: Vec<Pixel> = lines
        .iter()
        .map(|line| relative_to_pixel(line.position(orientation), extent))
        .filter(|&p| is_interior(p, extent))
        .collect();
    pixels.push(0);
    pixels.push(Pixel::from(extent));
    pixels.sort_unstable();
    pixels.dedup();
    pixels
}

/// Convert a relative line set to pixel positions including both boundaries.
///
/// Each orientation comes back strictly ascending, duplicate-free, and
/// starting at `0` and ending at the matching extent. Lines that round onto
/// or outside a boundary are absorbed by it.
pub fn to_pixels(lines: &LineSet, dims: ImageDimensions) -> Result<PixelLines, AnalysisError> {
    dims.validate()?;
    let axis = |o: Orientation| axis_to_pixels(lines.lines(o), o, dims.extent(o));
    Ok(PixelLines::new(axis(Orientation::Vertical), axis(Orientation::Horizontal)))
}

/// The interior part of [`to_pixels`]: what gets sent to and compared with
/// the analysis service.
pub fn interior_pixels(lines: &LineSet, dims: ImageDimensions) -> Result<PixelLines, AnalysisError> {
    let all = to_pixels(lines, dims)?;
    Ok(PixelLines {
        vertical: interior(&all.vertical, dims.width),
        horizontal: interior(&all.horizontal, dims.height),
    })
}

fn axis_to_relative(pixels: &[Pixel], orientation: Orientation, extent: u32) -> Vec<Line> {
    pixels
        .iter()
        .copied()
        .filter(|&p| is_interior(p, extent))
        .map(|p| Line::with_orientation(orientation, p as f64 / f64::from(extent)))
        .collect()
}

/// Convert pixel positions to a relative line set with fresh ids.
///
/// Boundary and out-of-range positions are dropped; input order is kept.
pub fn to_relative(pixels: &PixelLines, dims: ImageDimensions) -> Result<LineSet, AnalysisError> {
    dims.validate()?;
    let axis = |o: Orientation| axis_to_relative(pixels.get(o), o, dims.extent(o));
    Ok(LineSet::new(axis(Orientation::Horizontal), axis(Orientation::Vertical)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions { width, height }
    }

    #[test]
    fn test_to_pixels_adds_boundaries() {
        let lines = LineSet::from_fractions(&[0.75, 0.25, 0.5], &[0.5]);
        let px = to_pixels(&lines, dims(100, 100)).unwrap();
        assert_eq!(px.vertical, vec![0, 25, 50, 75, 100]);
        assert_eq!(px.horizontal, vec![0, 50, 100]);
    }

    #[test]
    fn test_to_pixels_dedupes_and_drops_out_of_range() {
        let lines = LineSet::from_fractions(&[0.5, 0.501, 0.0, 1.0, -0.2, 1.4], &[]);
        let px = to_pixels(&lines, dims(100, 40)).unwrap();
        assert_eq!(px.vertical, vec![0, 50, 100]);
        assert_eq!(px.horizontal, vec![0, 40]);
    }

    #[test]
    fn test_invalid_dimensions() {
        let lines = LineSet::from_fractions(&[0.5], &[0.5]);
        assert!(matches!(
            to_pixels(&lines, dims(0, 10)),
            Err(AnalysisError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            to_relative(&PixelLines::default(), dims(10, 0)),
            Err(AnalysisError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_to_relative_drops_boundaries() {
        let px = PixelLines::new(vec![0, 30, 60, 120], vec![-5, 20]);
        let lines = to_relative(&px, dims(120, 80)).unwrap();
        assert_eq!(lines.vertical.len(), 2);
        assert_eq!(lines.vertical[0].relative_x, 0.25);
        assert_eq!(lines.vertical[1].relative_x, 0.5);
        assert_eq!(lines.horizontal.len(), 1);
        assert_eq!(lines.horizontal[0].relative_y, 0.25);
    }

    #[test]
    fn test_interior_sorts() {
        assert_eq!(interior(&[90, 0, 10, 100, 50], 100), vec![10, 50, 90]);
    }

    #[test]
    fn test_interior_drops_repeats() {
        assert_eq!(interior(&[0, 50, 50, 100, 20, 50], 100), vec![20, 50]);
    }

    proptest! {
        #[test]
        fn prop_to_pixels_is_strictly_ascending_with_boundaries(
            xs in prop::collection::vec(-0.5f64..1.5, 0..12),
            ys in prop::collection::vec(-0.5f64..1.5, 0..12),
            width in 1u32..5000,
            height in 1u32..5000,
        ) {
            let px = to_pixels(&LineSet::from_fractions(&xs, &ys), dims(width, height)).unwrap();
            for (values, extent) in [(&px.vertical, width), (&px.horizontal, height)] {
                prop_assert_eq!(values.first().copied(), Some(0));
                prop_assert_eq!(values.last().copied(), Some(Pixel::from(extent)));
                prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            }
        }

        #[test]
        fn prop_interior_pixels_round_trip(
            width in 2u32..10_000,
            height in 2u32..10_000,
            seeds_x in prop::collection::vec(any::<u32>(), 0..10),
            seeds_y in prop::collection::vec(any::<u32>(), 0..10),
        ) {
            let mut xs: Vec<Pixel> = seeds_x.iter().map(|s| Pixel::from(s % (width - 1) + 1)).collect();
            let mut ys: Vec<Pixel> = seeds_y.iter().map(|s| Pixel::from(s % (height - 1) + 1)).collect();
            let d = dims(width, height);

            let relative = to_relative(&PixelLines::new(xs.clone(), ys.clone()), d).unwrap();
            let back = interior_pixels(&relative, d).unwrap();

            xs.sort_unstable();
            xs.dedup();
            ys.sort_unstable();
            ys.dedup();
            prop_assert_eq!(back.vertical, xs);
            prop_assert_eq!(back.horizontal, ys);
        }
    }
}
