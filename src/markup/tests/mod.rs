//! Scenario tests for markup import and export.
//!
//! These run the importer and exporter against in-memory doubles of the
//! analysis service and image storage.

mod import_tests;

use std::sync::Arc;

use crate::markup::{MarkupDocument, MarkupMetadata};
use crate::model::{Category, EncodedImage, SelectedCell};
use crate::session::ManualAnalysis;
use crate::testing::{FakeGateway, FakeStorage, png};

/// A session wired to fresh doubles.
fn session() -> (ManualAnalysis, Arc<FakeGateway>, Arc<FakeStorage>) {
    let gateway = Arc::new(FakeGateway::default());
    let storage = Arc::new(FakeStorage::default());
    let analysis = ManualAnalysis::new(gateway.clone(), storage.clone());
    (analysis, gateway, storage)
}

/// A 100x100 document with lines at 50 and one selected cell.
fn sample_document(name: Option<&str>) -> MarkupDocument {
    let original = EncodedImage::new("image/png", png(100, 100)).to_data_url();
    let blurred = EncodedImage::new("image/png", png(100, 100)).to_data_url();
    MarkupDocument {
        original_image: original,
        blurred_image: Some(blurred),
        metadata: MarkupMetadata {
            vertical_lines: vec![50],
            horizontal_lines: vec![50],
            selected_cells: vec![SelectedCell::new(0, 0, "a")],
            selection_categories: vec![Category::new("a", "Alpha", "#ff0000")],
            name: name.map(str::to_string),
            ..MarkupMetadata::default()
        },
    }
}
