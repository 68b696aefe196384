//! In-memory doubles of the remote collaborators for tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::grid;
use crate::model::{
    BrightnessMatrix, CategorizedMeanResult, DatasetId, EncodedImage, ImageId, ManualParameters,
    ManualResult, Pixel,
};
use crate::remote::{
    AnalysisGateway, BlurParams, CategorizedMeanRequest, ImageStorage, MeanLinesRequest,
    MeanLinesResponse, UploadResponse,
};

/// Encode a black PNG of the given size.
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Cell `(row, col)` of a `rows x cols` grid has value `row * cols + col`.
pub(crate) fn ramp(rows: usize, cols: usize) -> BrightnessMatrix {
    BrightnessMatrix::from_values(
        (0..rows)
            .map(|r| (0..cols).map(|c| (r * cols + c) as f64).collect())
            .collect(),
    )
}

#[derive(Default)]
struct GatewayState {
    mean_requests: Vec<MeanLinesRequest>,
    categorized_requests: Vec<CategorizedMeanRequest>,
    results: HashMap<ImageId, ManualResult>,
    categorized: HashMap<ImageId, CategorizedMeanResult>,
    echo: Option<(Vec<Pixel>, Vec<Pixel>)>,
    unsuccessful: Option<String>,
    failure: Option<String>,
    blur_count: usize,
    next_result_id: u64,
}

/// Analysis service double computing [`ramp`] means and persisting them.
#[derive(Default)]
pub(crate) struct FakeGateway {
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    pub(crate) fn mean_requests(&self) -> Vec<MeanLinesRequest> {
        self.state.lock().unwrap().mean_requests.clone()
    }

    pub(crate) fn categorized_requests(&self) -> Vec<CategorizedMeanRequest> {
        self.state.lock().unwrap().categorized_requests.clone()
    }

    pub(crate) fn blur_count(&self) -> usize {
        self.state.lock().unwrap().blur_count
    }

    /// Echo these lines instead of the requested ones.
    pub(crate) fn set_echo(&self, vertical: Vec<Pixel>, horizontal: Vec<Pixel>) {
        self.state.lock().unwrap().echo = Some((vertical, horizontal));
    }

    /// Answer mean requests with `success: false`.
    pub(crate) fn fail_with_unsuccessful(&self, message: &str) {
        self.state.lock().unwrap().unsuccessful = Some(message.to_string());
    }

    /// Answer mean requests with an HTTP 500.
    pub(crate) fn fail_with_server_error(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_string());
    }
}

#[async_trait]
impl AnalysisGateway for FakeGateway {
    async fn compute_means(
        &self,
        image_id: ImageId,
        request: &MeanLinesRequest,
    ) -> Result<MeanLinesResponse, AnalysisError> {
        let mut state = self.state.lock().unwrap();
        state.mean_requests.push(request.clone());
        if let Some(message) = &state.failure {
            return Err(AnalysisError::remote(Some(500), message.clone()));
        }
        if let Some(message) = &state.unsuccessful {
            return Ok(MeanLinesResponse {
                success: false,
                message: message.clone(),
                means: BrightnessMatrix::default(),
                image_id,
                result_id: 0,
                vertical_lines: None,
                horizontal_lines: None,
            });
        }

        let (vertical, horizontal) = state
            .echo
            .clone()
            .unwrap_or_else(|| (request.vertical_lines.clone(), request.horizontal_lines.clone()));
        let means = ramp(horizontal.len() + 1, vertical.len() + 1);
        state.next_result_id += 1;
        let result_id = state.next_result_id;
        state.results.insert(
            image_id,
            ManualResult {
                id: result_id,
                image_id,
                parameters: ManualParameters {
                    image_id,
                    horizontal_lines: horizontal.clone(),
                    vertical_lines: vertical.clone(),
                    image_width: 0,
                    image_height: 0,
                },
                brightness_data: means.clone(),
                created_at: Some("2024-01-01T00:00:00".to_string()),
                updated_at: None,
            },
        );
        Ok(MeanLinesResponse {
            success: true,
            message: "Mean values calculated".to_string(),
            means,
            image_id,
            result_id,
            vertical_lines: Some(vertical),
            horizontal_lines: Some(horizontal),
        })
    }

    async fn compute_categorized(
        &self,
        image_id: ImageId,
        request: &CategorizedMeanRequest,
    ) -> Result<CategorizedMeanResult, AnalysisError> {
        let mut state = self.state.lock().unwrap();
        state.categorized_requests.push(request.clone());
        let means = ramp(
            request.horizontal_lines.len() + 1,
            request.vertical_lines.len() + 1,
        );
        let summary = grid::summarize(&means);
        let result = CategorizedMeanResult {
            success: true,
            message: "Categorized means calculated".to_string(),
            image_id,
            result_id: 1,
            all_cells_mean: summary.overall_mean,
            category_results: grid::aggregate_by_category(
                &means,
                &request.selected_cells,
                &request.selection_categories,
            ),
            overall_mean: summary.overall_mean,
            vertical_lines: request.vertical_lines.clone(),
            horizontal_lines: request.horizontal_lines.clone(),
            total_cells: means.rows() * means.cols(),
            selected_cells_count: request.selected_cells.len(),
        };
        state.categorized.insert(image_id, result.clone());
        Ok(result)
    }

    async fn existing_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<ManualResult>, AnalysisError> {
        Ok(self.state.lock().unwrap().results.get(&image_id).cloned())
    }

    async fn categorized_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<CategorizedMeanResult>, AnalysisError> {
        Ok(self.state.lock().unwrap().categorized.get(&image_id).cloned())
    }

    async fn gaussian_blur(
        &self,
        _image_id: ImageId,
        _params: &BlurParams,
    ) -> Result<EncodedImage, AnalysisError> {
        self.state.lock().unwrap().blur_count += 1;
        Ok(EncodedImage::new("image/png", png(2, 2)))
    }
}

/// A recorded upload.
#[derive(Debug, Clone)]
pub(crate) struct Upload {
    pub dataset_id: DatasetId,
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub image_id: ImageId,
}

#[derive(Default)]
struct StorageState {
    images: HashMap<ImageId, EncodedImage>,
    uploads: Vec<Upload>,
    downloads: usize,
    next_id: ImageId,
    reject: Option<String>,
}

/// Image storage double handing out sequential ids from 100.
#[derive(Default)]
pub(crate) struct FakeStorage {
    state: Mutex<StorageState>,
}

impl FakeStorage {
    pub(crate) fn insert(&self, image_id: ImageId, image: EncodedImage) {
        self.state.lock().unwrap().images.insert(image_id, image);
    }

    pub(crate) fn uploads(&self) -> Vec<Upload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub(crate) fn download_count(&self) -> usize {
        self.state.lock().unwrap().downloads
    }

    /// Refuse every upload with `success: false`.
    pub(crate) fn reject_uploads(&self, message: &str) {
        self.state.lock().unwrap().reject = Some(message.to_string());
    }
}

#[async_trait]
impl ImageStorage for FakeStorage {
    async fn upload(
        &self,
        dataset_id: DatasetId,
        file_name: &str,
        image: &EncodedImage,
        title: &str,
        description: &str,
    ) -> Result<UploadResponse, AnalysisError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.reject {
            return Ok(UploadResponse {
                success: false,
                message: message.clone(),
                image_id: None,
            });
        }
        let image_id = 100 + state.next_id;
        state.next_id += 1;
        state.images.insert(image_id, image.clone());
        state.uploads.push(Upload {
            dataset_id,
            file_name: file_name.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            image_id,
        });
        Ok(UploadResponse {
            success: true,
            message: "Image uploaded".to_string(),
            image_id: Some(image_id),
        })
    }

    async fn download(&self, image_id: ImageId) -> Result<EncodedImage, AnalysisError> {
        let mut state = self.state.lock().unwrap();
        state.downloads += 1;
        state
            .images
            .get(&image_id)
            .cloned()
            .ok_or_else(|| AnalysisError::remote(Some(404), "Image not found"))
    }
}
