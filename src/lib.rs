//! Lumagrid - manual grid analysis of images.
//!
//! An image is partitioned into cells by vertical and horizontal lines. A
//! remote analysis service computes the mean brightness of every cell; this
//! crate keeps the per-image analysis state, converts lines between relative
//! and pixel space, aggregates the brightness matrix by row, column and
//! user-defined category, and imports and exports self-contained markup
//! documents.

pub mod config;
pub mod constants;
pub mod coords;
pub mod dirty;
pub mod error;
pub mod grid;
pub mod markup;
pub mod model;
pub mod remote;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{AnalysisError, ErrorKind};
pub use markup::{MarkupDocument, MarkupExporter, MarkupImporter};
pub use session::{ManualAnalysis, TableSnapshot};
pub use state::{AnalysisState, AnalysisStateStore};
