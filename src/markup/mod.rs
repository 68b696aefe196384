//! Markup documents: self-contained JSON snapshots of one analyzed image.
//!
//! A document carries the original and blurred images as data URLs, the
//! pixel lines, the luminance matrix and the category selection. Importing
//! one recreates the analysis on the server for a fresh image id; exporting
//! produces one from a session's cached state.

mod archive;
mod document;
mod exporter;
mod importer;

#[cfg(test)]
mod tests;

pub use archive::{MarkupSource, extract_markup_from_zip_file, is_zip_path, read_sources};
pub use document::{MarkupDocument, MarkupMetadata};
pub use exporter::MarkupExporter;
pub use importer::{ImportProgress, ImportResult, ImportedImage, MarkupImporter};
