//! Manual grid analysis of individual images.
//!
//! [`ManualAnalysis`] owns the per-image [`AnalysisStateStore`] and drives the
//! remote collaborators. Every method takes `&mut self`, so two calls for
//! the same image can never overlap on one session; the `busy` flag on the
//! state only reports an in-flight request to whoever renders it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::AppConfig;
use crate::constants::DEFAULT_LINE_FRACTIONS;
use crate::coords::{self, PixelLines};
use crate::error::AnalysisError;
use crate::grid::{self, CellBlockSize, CellRect, GridSummary};
use crate::model::{
    CategorizedMeanResult, Category, CellPosition, EncodedImage, ImageDimensions, ImageId,
    LineSet, ManualParameters, ManualResult, SelectedCell,
};
use crate::remote::{
    AnalysisGateway, BlurParams, CategorizedMeanRequest, HttpAnalysisGateway, HttpImageStorage,
    ImageStorage, MeanLinesRequest, MeanLinesResponse,
};
use crate::state::{AnalysisState, AnalysisStateStore};

/// What a result table needs to render one image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub cols: usize,
    /// Approximate cell size
    pub block_size: CellBlockSize,
    /// Aggregates of the last server result, if there is one
    pub summary: Option<GridSummary>,
    /// Current lines differ from the ones the summary was computed against
    pub dirty: bool,
}

/// Manual analysis session over a set of images.
pub struct ManualAnalysis {
    store: AnalysisStateStore,
    gateway: Arc<dyn AnalysisGateway>,
    storage: Arc<dyn ImageStorage>,
    blur: BlurParams,
}

impl ManualAnalysis {
    /// Create a session with the given collaborators and default blur.
    pub fn new(gateway: Arc<dyn AnalysisGateway>, storage: Arc<dyn ImageStorage>) -> Self {
        Self {
            store: AnalysisStateStore::new(),
            gateway,
            storage,
            blur: BlurParams::default(),
        }
    }

    /// Create a session talking HTTP to the configured servers.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let gateway = HttpAnalysisGateway::from_config(&config.server)?;
        let storage = HttpImageStorage::from_config(&config.server)?;
        Ok(Self::new(Arc::new(gateway), Arc::new(storage)).with_blur(config.blur))
    }

    /// Use different blur parameters for [`blurred_image`](Self::blurred_image).
    pub fn with_blur(mut self, blur: BlurParams) -> Self {
        self.blur = blur;
        self
    }

    /// The per-image state store.
    pub fn store(&self) -> &AnalysisStateStore {
        &self.store
    }

    /// State of one image, if any was created.
    pub fn state(&self, image_id: ImageId) -> Option<&AnalysisState> {
        self.store.get(image_id)
    }

    /// The image storage collaborator.
    pub fn storage(&self) -> &Arc<dyn ImageStorage> {
        &self.storage
    }

    /// The original image as a data URL, downloading it on first use.
    ///
    /// Also captures the image dimensions.
    pub async fn load_original_image(&mut self, image_id: ImageId) -> Result<String, AnalysisError> {
        if let Some(url) = self.store.get(image_id).and_then(|s| s.original_image.clone()) {
            return Ok(url);
        }

        let image = self.storage.download(image_id).await?;
        let dims = self.storage.decode_dimensions(&image)?;
        let url = image.to_data_url();
        log::info!(
            "Loaded original image {} ({}x{}, {} bytes)",
            image_id,
            dims.width,
            dims.height,
            image.bytes.len()
        );

        let state = self.store.get_or_create(image_id);
        state.original_image = Some(url.clone());
        state.dimensions = Some(dims);
        state.refresh_dirty();
        Ok(url)
    }

    /// The blurred image as a data URL, requesting it on first use.
    pub async fn blurred_image(&mut self, image_id: ImageId) -> Result<String, AnalysisError> {
        if let Some(url) = self.store.get(image_id).and_then(|s| s.blurred_image.clone()) {
            return Ok(url);
        }

        let image = self.gateway.gaussian_blur(image_id, &self.blur).await?;
        log::debug!(
            "Received blurred image {} (kernel {})",
            image_id,
            self.blur.kernel_size
        );
        let url = image.to_data_url();
        self.store.get_or_create(image_id).blurred_image = Some(url.clone());
        Ok(url)
    }

    /// Look up a persisted result and adopt it.
    ///
    /// When dimensions are known the stored lines replace the current ones.
    pub async fn check_existing_result(
        &mut self,
        image_id: ImageId,
    ) -> Result<Option<ManualResult>, AnalysisError> {
        let Some(result) = self.gateway.existing_result(image_id).await? else {
            return Ok(None);
        };
        log::info!("Found existing result {} for image {}", result.id, image_id);

        let state = self.store.get_or_create(image_id);
        if let Some(dims) = state.dimensions {
            let params = &result.parameters;
            let pixels = PixelLines::new(params.vertical_lines.clone(), params.horizontal_lines.clone());
            state.current_lines = coords::to_relative(&pixels, dims)?;
        }
        state.last_server_result = Some(result.clone());
        state.refresh_dirty();
        Ok(Some(result))
    }

    /// Replace the lines with three per orientation at a quarter, half and
    /// three quarters of the image.
    pub fn initialize_default_lines(&mut self, image_id: ImageId) -> Result<LineSet, AnalysisError> {
        self.dimensions(image_id)?;
        let lines = LineSet::from_fractions(&DEFAULT_LINE_FRACTIONS, &DEFAULT_LINE_FRACTIONS);
        self.store.set_lines(image_id, lines.clone());
        Ok(lines)
    }

    /// Replace the lines of an image. Returns the new dirty flag.
    pub fn update_lines(&mut self, image_id: ImageId, lines: LineSet) -> bool {
        self.store.set_lines(image_id, lines)
    }

    fn dimensions(&self, image_id: ImageId) -> Result<ImageDimensions, AnalysisError> {
        self.store
            .get(image_id)
            .and_then(|s| s.dimensions)
            .ok_or(AnalysisError::DimensionsUnavailable { image_id })
    }

    /// Check the preconditions of a remote computation and mark it busy.
    fn begin_computation(
        &mut self,
        image_id: ImageId,
    ) -> Result<(ImageDimensions, PixelLines), AnalysisError> {
        let dims = self.dimensions(image_id)?;
        let state = self.store.get_or_create(image_id);
        if !state.current_lines.is_configured() {
            return Err(AnalysisError::LinesNotConfigured { image_id });
        }
        let pixels = coords::interior_pixels(&state.current_lines, dims)?;
        state.busy = true;
        Ok((dims, pixels))
    }

    fn end_computation(&mut self, image_id: ImageId) {
        if let Some(state) = self.store.get_mut(image_id) {
            state.busy = false;
        }
    }

    /// Compute per-cell means for the current lines and adopt the result.
    ///
    /// The lines the server echoes back replace the current lines.
    pub async fn calculate_mean_lines(
        &mut self,
        image_id: ImageId,
    ) -> Result<MeanLinesResponse, AnalysisError> {
        let (dims, pixels) = self.begin_computation(image_id)?;
        let outcome = self.compute_means(image_id, dims, pixels).await;
        self.end_computation(image_id);
        outcome
    }

    async fn compute_means(
        &mut self,
        image_id: ImageId,
        dims: ImageDimensions,
        pixels: PixelLines,
    ) -> Result<MeanLinesResponse, AnalysisError> {
        let request = MeanLinesRequest {
            vertical_lines: pixels.vertical,
            horizontal_lines: pixels.horizontal,
        };
        log::info!(
            "Calculating means for image {} ({} vertical, {} horizontal lines)",
            image_id,
            request.vertical_lines.len(),
            request.horizontal_lines.len()
        );
        let response = self.gateway.compute_means(image_id, &request).await?;
        if !response.success {
            return Err(AnalysisError::remote(None, response.message));
        }

        let (vertical, horizontal) = match response.echoed_lines() {
            Some((v, h)) => (v.to_vec(), h.to_vec()),
            None => {
                log::warn!("Server did not echo lines for image {}", image_id);
                (request.vertical_lines, request.horizontal_lines)
            }
        };
        let resynced = coords::to_relative(&PixelLines::new(vertical.clone(), horizontal.clone()), dims)?;

        let state = self.store.get_or_create(image_id);
        state.current_lines = resynced;
        state.last_server_result = Some(ManualResult {
            id: response.result_id,
            image_id,
            parameters: ManualParameters {
                image_id,
                horizontal_lines: horizontal,
                vertical_lines: vertical,
                image_width: dims.width,
                image_height: dims.height,
            },
            brightness_data: response.means.clone(),
            created_at: None,
            updated_at: None,
        });
        state.refresh_dirty();
        log::info!(
            "Means for image {}: {}x{} cells, result {}",
            image_id,
            response.means.rows(),
            response.means.cols(),
            response.result_id
        );
        Ok(response)
    }

    /// Compute per-category aggregates for a cell selection.
    pub async fn calculate_categorized_mean(
        &mut self,
        image_id: ImageId,
        selected_cells: &[SelectedCell],
        categories: &[Category],
    ) -> Result<CategorizedMeanResult, AnalysisError> {
        let (_, pixels) = self.begin_computation(image_id)?;
        let request = CategorizedMeanRequest {
            vertical_lines: pixels.vertical,
            horizontal_lines: pixels.horizontal,
            selected_cells: selected_cells.to_vec(),
            selection_categories: categories.to_vec(),
            image_id,
        };
        let outcome = self.gateway.compute_categorized(image_id, &request).await;
        self.end_computation(image_id);

        let result = outcome?;
        if !result.success {
            return Err(AnalysisError::remote(None, result.message));
        }
        log::info!(
            "Categorized means for image {}: {} categories over {} selected cells",
            image_id,
            result.category_results.len(),
            result.selected_cells_count
        );
        Ok(result)
    }

    /// The persisted categorized result of an image, if any.
    pub async fn categorized_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<CategorizedMeanResult>, AnalysisError> {
        self.gateway.categorized_result(image_id).await
    }

    /// Cell to category assignments of the persisted categorized result.
    ///
    /// Empty when there is no stored result.
    pub async fn restore_cell_selections(
        &self,
        image_id: ImageId,
    ) -> Result<BTreeMap<CellPosition, String>, AnalysisError> {
        let Some(result) = self.categorized_result(image_id).await? else {
            return Ok(BTreeMap::new());
        };
        let selections: BTreeMap<CellPosition, String> = result
            .category_results
            .iter()
            .flat_map(|category| {
                category
                    .cells
                    .iter()
                    .map(move |cell| (*cell, category.category_id.clone()))
            })
            .collect();
        log::debug!("Restored {} cell selections for image {}", selections.len(), image_id);
        Ok(selections)
    }

    /// Pixel rectangles of every grid cell.
    pub fn cell_coordinates(&self, image_id: ImageId) -> Result<Vec<Vec<CellRect>>, AnalysisError> {
        let dims = self.dimensions(image_id)?;
        let lines = self
            .store
            .get(image_id)
            .map(|s| &s.current_lines)
            .ok_or(AnalysisError::DimensionsUnavailable { image_id })?;
        grid::cell_coordinates(lines, dims)
    }

    /// Approximate cell size, or the default when dimensions are unknown.
    pub fn cell_block_size(&self, image_id: ImageId) -> CellBlockSize {
        match self.store.get(image_id) {
            Some(AnalysisState {
                dimensions: Some(dims),
                current_lines,
                ..
            }) => grid::cell_block_size(current_lines, *dims),
            _ => CellBlockSize::default(),
        }
    }

    /// Row, column and overall means of the last server result.
    pub fn recalculate_all_means(&self, image_id: ImageId) -> Result<GridSummary, AnalysisError> {
        let matrix = self
            .store
            .get(image_id)
            .and_then(|s| s.last_server_result.as_ref())
            .map(|r| &r.brightness_data)
            .filter(|m| !m.is_empty())
            .ok_or(AnalysisError::NoBrightnessData { image_id })?;
        Ok(grid::summarize(matrix))
    }

    /// Grid shape and aggregates for a result table.
    ///
    /// An image with known dimensions but no lines gets the default lines.
    pub fn table_snapshot(&mut self, image_id: ImageId) -> TableSnapshot {
        let needs_defaults = self
            .store
            .get(image_id)
            .is_some_and(|s| s.dimensions.is_some() && s.current_lines.is_empty());
        if needs_defaults {
            log::debug!("Initializing default lines for image {}", image_id);
            let lines = LineSet::from_fractions(&DEFAULT_LINE_FRACTIONS, &DEFAULT_LINE_FRACTIONS);
            self.store.set_lines(image_id, lines);
        }

        let state = self.store.get_or_create(image_id);
        let (rows, cols) = grid::grid_shape(&state.current_lines);
        let summary = state
            .last_server_result
            .as_ref()
            .filter(|r| !r.brightness_data.is_empty())
            .map(|r| grid::summarize(&r.brightness_data));
        let dirty = state.dirty;
        TableSnapshot {
            rows,
            cols,
            block_size: self.cell_block_size(image_id),
            summary,
            dirty,
        }
    }

    /// Cache the original and blurred data URLs of an image.
    ///
    /// Used when the images are already at hand, as during import.
    pub(crate) fn cache_images(
        &mut self,
        image_id: ImageId,
        original: &str,
        blurred: Option<&str>,
    ) {
        let state = self.store.get_or_create(image_id);
        state.original_image = Some(original.to_string());
        state.blurred_image = blurred.map(str::to_string);
    }

    /// Decode an image with the storage collaborator and record its dimensions.
    pub(crate) fn capture_dimensions(
        &mut self,
        image_id: ImageId,
        image: &EncodedImage,
    ) -> Result<ImageDimensions, AnalysisError> {
        let dims = self.storage.decode_dimensions(image)?;
        let state = self.store.get_or_create(image_id);
        state.dimensions = Some(dims);
        state.refresh_dirty();
        Ok(dims)
    }

    /// Drop all state of an image.
    pub fn clear_state(&mut self, image_id: ImageId) {
        self.store.clear(image_id);
    }
}
