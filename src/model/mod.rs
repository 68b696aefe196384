//! Data models for grid analysis.

mod category;
mod dimensions;
mod encoded_image;
mod line;
mod matrix;
mod result;

pub use category::{Category, CategoryMeanResult, CellPosition, SelectedCell};
pub use dimensions::ImageDimensions;
pub use encoded_image::EncodedImage;
pub use line::{Line, LineSet, Orientation, Pixel};
pub use matrix::BrightnessMatrix;
pub use result::{CategorizedMeanResult, ManualParameters, ManualResult};

pub(crate) use line::deserialize_pixel_lines;

/// Identifier of an image in the remote image storage.
pub type ImageId = u64;

/// Identifier of a dataset in the remote image storage.
pub type DatasetId = u64;
