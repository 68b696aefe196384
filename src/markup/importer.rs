//! Recreating analyses from markup documents.

use std::path::PathBuf;

use web_time::Instant;

use crate::coords::{self, PixelLines};
use crate::error::AnalysisError;
use crate::markup::archive::{self, MarkupSource};
use crate::markup::document::{MarkupDocument, strip_extension};
use crate::model::{CategorizedMeanResult, DatasetId, ImageDimensions, ImageId};
use crate::remote::MeanLinesResponse;
use crate::session::ManualAnalysis;

/// Progress of a batch import, reported after every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    /// Items processed so far, failed ones included
    pub completed: usize,
    /// Items in the batch
    pub total: usize,
    /// `completed / total` as a rounded percentage
    pub percent: u32,
}

impl ImportProgress {
    fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Per-item outcome of a batch import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    /// Uploaded file name on success, source name on failure
    pub filename: String,
    /// Whether the item was imported completely
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Id of the created image, when the upload got that far
    pub image_id: Option<ImageId>,
}

/// Everything one successful import produced.
#[derive(Debug, Clone)]
pub struct ImportedImage {
    /// Id of the created image
    pub image_id: ImageId,
    /// Name the image was uploaded under
    pub filename: String,
    /// Dimensions of the original image
    pub dimensions: ImageDimensions,
    /// The recomputed per-cell means
    pub means: MeanLinesResponse,
    /// The recomputed category aggregates
    pub categorized: CategorizedMeanResult,
}

/// Failure of a single import, remembering how far it got.
#[derive(Debug)]
struct ImportFailure {
    filename: Option<String>,
    image_id: Option<ImageId>,
    error: AnalysisError,
}

impl From<AnalysisError> for ImportFailure {
    fn from(error: AnalysisError) -> Self {
        Self {
            filename: None,
            image_id: None,
            error,
        }
    }
}

/// Imports markup documents into a dataset.
#[derive(Debug, Clone)]
pub struct MarkupImporter {
    dataset_id: DatasetId,
    description: String,
}

impl MarkupImporter {
    /// Create an importer uploading into `dataset_id`.
    pub fn new(dataset_id: DatasetId) -> Self {
        Self {
            dataset_id,
            description: String::new(),
        }
    }

    /// Set the description attached to every uploaded image.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Target dataset.
    pub fn dataset_id(&self) -> DatasetId {
        self.dataset_id
    }

    /// Import one document.
    ///
    /// The document is validated and its image decoded before anything is
    /// uploaded, so a malformed document has no side effects. Once the
    /// upload succeeded, later failures leave the new image's state as far
    /// as it got.
    pub async fn import_document(
        &self,
        analysis: &mut ManualAnalysis,
        document: &MarkupDocument,
    ) -> Result<ImportedImage, AnalysisError> {
        self.import_tracked(analysis, document)
            .await
            .map_err(|failure| failure.error)
    }

    /// Parse and import one JSON document.
    pub async fn import_json(
        &self,
        analysis: &mut ManualAnalysis,
        json: &str,
    ) -> Result<ImportedImage, AnalysisError> {
        let document = MarkupDocument::from_json(json)?;
        self.import_document(analysis, &document).await
    }

    async fn import_tracked(
        &self,
        analysis: &mut ManualAnalysis,
        document: &MarkupDocument,
    ) -> Result<ImportedImage, ImportFailure> {
        let image = document.original()?;
        let filename = document.file_name();
        let title = strip_extension(&filename);

        let upload = analysis
            .storage()
            .upload(self.dataset_id, &filename, &image, title, &self.description)
            .await
            .map_err(|error| ImportFailure {
                filename: Some(filename.clone()),
                image_id: None,
                error,
            })?;
        let image_id = match upload.image_id {
            Some(id) if upload.success => id,
            _ => {
                return Err(ImportFailure {
                    filename: Some(filename),
                    image_id: None,
                    error: AnalysisError::Upload {
                        message: upload.message,
                    },
                });
            }
        };
        log::info!(
            "Uploaded '{}' to dataset {} as image {}",
            filename,
            self.dataset_id,
            image_id
        );

        let fail = |error: AnalysisError| ImportFailure {
            filename: Some(filename.clone()),
            image_id: Some(image_id),
            error,
        };

        analysis.cache_images(
            image_id,
            &document.original_image,
            document.blurred_image.as_deref(),
        );
        let dimensions = analysis.capture_dimensions(image_id, &image).map_err(fail)?;

        let metadata = &document.metadata;
        let pixels = PixelLines::new(
            metadata.vertical_lines.clone(),
            metadata.horizontal_lines.clone(),
        );
        let lines = coords::to_relative(&pixels, dimensions).map_err(fail)?;
        analysis.update_lines(image_id, lines);

        let means = analysis.calculate_mean_lines(image_id).await.map_err(fail)?;
        let categorized = analysis
            .calculate_categorized_mean(
                image_id,
                &metadata.selected_cells,
                &metadata.selection_categories,
            )
            .await
            .map_err(fail)?;

        Ok(ImportedImage {
            image_id,
            filename,
            dimensions,
            means,
            categorized,
        })
    }

    /// Import a batch of sources one after another.
    ///
    /// A failing item is reported and the batch continues. `on_progress` is
    /// called after every item.
    pub async fn import_sources(
        &self,
        analysis: &mut ManualAnalysis,
        sources: Vec<MarkupSource>,
        mut on_progress: impl FnMut(ImportProgress),
    ) -> Vec<ImportResult> {
        let total = sources.len();
        let start = Instant::now();
        let mut results = Vec::with_capacity(total);

        log::info!("Importing {} markup files into dataset {}", total, self.dataset_id);

        for (index, source) in sources.into_iter().enumerate() {
            let outcome = match source.data {
                Ok(bytes) => match MarkupDocument::from_slice(&bytes) {
                    Ok(document) => self.import_tracked(analysis, &document).await,
                    Err(e) => Err(e.into()),
                },
                Err(e) => Err(e.into()),
            };

            let result = match outcome {
                Ok(imported) => ImportResult {
                    filename: imported.filename,
                    success: true,
                    message: "Markup imported successfully.".to_string(),
                    image_id: Some(imported.image_id),
                },
                Err(failure) => {
                    log::error!("Failed to import '{}': {}", source.name, failure.error);
                    ImportResult {
                        filename: failure.filename.unwrap_or(source.name),
                        success: false,
                        message: failure.error.user_message(),
                        image_id: failure.image_id,
                    }
                }
            };
            results.push(result);
            on_progress(ImportProgress::new(index + 1, total));
        }

        let imported = results.iter().filter(|r| r.success).count();
        log::info!(
            "Imported {}/{} markup files in {:.1}s",
            imported,
            total,
            start.elapsed().as_secs_f64()
        );
        results
    }

    /// Import markup files and ZIP archives from disk.
    pub async fn import_paths(
        &self,
        analysis: &mut ManualAnalysis,
        paths: &[PathBuf],
        on_progress: impl FnMut(ImportProgress),
    ) -> Vec<ImportResult> {
        let sources = archive::read_sources(paths);
        self.import_sources(analysis, sources, on_progress).await
    }
}
