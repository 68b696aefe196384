//! Collaborator traits for remote computation and image storage.

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::model::{
    CategorizedMeanResult, DatasetId, EncodedImage, ImageDimensions, ImageId, ManualResult,
};
use crate::remote::wire::{BlurParams, CategorizedMeanRequest, MeanLinesRequest, MeanLinesResponse};

/// Remote service computing brightness aggregates for a grid.
///
/// All line positions on this interface are interior integer pixels.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Compute per-cell means for the given lines and persist them as the
    /// image's result.
    async fn compute_means(
        &self,
        image_id: ImageId,
        request: &MeanLinesRequest,
    ) -> Result<MeanLinesResponse, AnalysisError>;

    /// Compute per-category aggregates for a cell selection.
    async fn compute_categorized(
        &self,
        image_id: ImageId,
        request: &CategorizedMeanRequest,
    ) -> Result<CategorizedMeanResult, AnalysisError>;

    /// The persisted mean result, or `None` if the image has none.
    async fn existing_result(&self, image_id: ImageId)
    -> Result<Option<ManualResult>, AnalysisError>;

    /// The persisted categorized result, or `None` if absent or unusable.
    async fn categorized_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<CategorizedMeanResult>, AnalysisError>;

    /// Blur the stored image and return the encoded result.
    async fn gaussian_blur(
        &self,
        image_id: ImageId,
        params: &BlurParams,
    ) -> Result<EncodedImage, AnalysisError>;
}

/// Outcome of an image upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// Whether the storage accepted the image
    pub success: bool,
    /// Message from the storage service
    pub message: String,
    /// Id of the new image, present on success
    pub image_id: Option<ImageId>,
}

/// Remote image storage.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Create a new image in a dataset.
    async fn upload(
        &self,
        dataset_id: DatasetId,
        file_name: &str,
        image: &EncodedImage,
        title: &str,
        description: &str,
    ) -> Result<UploadResponse, AnalysisError>;

    /// Fetch the original bytes of a stored image.
    async fn download(&self, image_id: ImageId) -> Result<EncodedImage, AnalysisError>;

    /// Read the pixel dimensions of an encoded image.
    fn decode_dimensions(&self, image: &EncodedImage) -> Result<ImageDimensions, AnalysisError> {
        image.probe_dimensions()
    }
}
