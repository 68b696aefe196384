//! Single-document import tests.

use super::{sample_document, session};
use crate::error::{AnalysisError, ErrorKind};
use crate::markup::MarkupImporter;
use crate::model::EncodedImage;
use crate::testing::png;

#[tokio::test]
async fn test_import_creates_one_synced_image() {
    let (mut analysis, gateway, storage) = session();
    let importer = MarkupImporter::new(5);

    let imported = importer
        .import_document(&mut analysis, &sample_document(Some("scan_01.png")))
        .await
        .unwrap();

    let uploads = storage.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].dataset_id, 5);
    assert_eq!(uploads[0].file_name, "scan_01.png");
    assert_eq!(uploads[0].title, "scan_01");
    assert_eq!(imported.image_id, uploads[0].image_id);
    assert_eq!(imported.dimensions.width, 100);

    let state = analysis.state(imported.image_id).unwrap();
    assert!(state.last_server_result.is_some());
    assert!(!state.dirty);
    assert!(!state.busy);
    assert!(state.blurred_image.is_some());

    let requests = gateway.mean_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].vertical_lines, vec![50]);
    assert_eq!(requests[0].horizontal_lines, vec![50]);

    let categorized = gateway.categorized_requests();
    assert_eq!(categorized.len(), 1);
    assert_eq!(categorized[0].image_id, imported.image_id);
    assert_eq!(imported.categorized.category_results[0].cell_count, 1);
}

#[tokio::test]
async fn test_undecodable_original_uploads_nothing() {
    let (mut analysis, gateway, storage) = session();
    let mut document = sample_document(None);
    document.original_image = "data:image/png;base64,@@not-base64@@".to_string();

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &document)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert!(storage.uploads().is_empty());
    assert!(gateway.mean_requests().is_empty());
    assert!(analysis.store().is_empty());
}

#[tokio::test]
async fn test_non_image_payload_uploads_nothing() {
    let (mut analysis, _, storage) = session();
    let mut document = sample_document(None);
    document.original_image = "data:image/png;base64,AQIDBA==".to_string();

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &document)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::MalformedMarkup { .. }));
    assert!(storage.uploads().is_empty());
}

#[tokio::test]
async fn test_invalid_json_is_validation_error() {
    let (mut analysis, _, storage) = session();
    let err = MarkupImporter::new(1)
        .import_json(&mut analysis, "{ not json")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(storage.uploads().is_empty());
}

#[tokio::test]
async fn test_rejected_upload_has_no_side_effects() {
    let (mut analysis, gateway, storage) = session();
    storage.reject_uploads("dataset is read-only");

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &sample_document(None))
        .await
        .unwrap_err();

    match err {
        AnalysisError::Upload { message } => assert_eq!(message, "dataset is read-only"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(analysis.store().is_empty());
    assert!(gateway.mean_requests().is_empty());
}

#[tokio::test]
async fn test_failed_computation_leaves_partial_state() {
    let (mut analysis, gateway, storage) = session();
    gateway.fail_with_server_error("boom");

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &sample_document(None))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteComputation);
    let image_id = storage.uploads()[0].image_id;
    let state = analysis.state(image_id).unwrap();
    assert!(state.original_image.is_some());
    assert!(state.dimensions.is_some());
    assert!(state.last_server_result.is_none());
    assert!(state.dirty);
    assert!(!state.busy);
}

#[tokio::test]
async fn test_truncated_original_fails_after_upload() {
    let (mut analysis, gateway, storage) = session();
    let mut document = sample_document(None);
    let truncated = png(10, 10)[..16].to_vec();
    document.original_image = EncodedImage::new("image/png", truncated).to_data_url();

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &document)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::DimensionProbeFailed { .. }));
    let uploads = storage.uploads();
    assert_eq!(uploads.len(), 1);
    let state = analysis.state(uploads[0].image_id).unwrap();
    assert!(state.original_image.is_some());
    assert_eq!(state.dimensions, None);
    assert!(gateway.mean_requests().is_empty());
}

#[tokio::test]
async fn test_description_is_attached_to_upload() {
    let (mut analysis, _, storage) = session();
    let importer = MarkupImporter::new(3).with_description("field survey");
    assert_eq!(importer.dataset_id(), 3);

    importer
        .import_document(&mut analysis, &sample_document(None))
        .await
        .unwrap();

    let uploads = storage.uploads();
    assert_eq!(uploads[0].dataset_id, 3);
    assert_eq!(uploads[0].description, "field survey");
}

#[tokio::test]
async fn test_document_without_lines_is_state_error() {
    let (mut analysis, _, _) = session();
    let mut document = sample_document(None);
    document.metadata.vertical_lines.clear();

    let err = MarkupImporter::new(1)
        .import_document(&mut analysis, &document)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::LinesNotConfigured { .. }));
}
