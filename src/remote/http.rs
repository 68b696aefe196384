//! `reqwest` implementations of the remote collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use crate::config::ServerConfig;
use crate::error::AnalysisError;
use crate::model::{CategorizedMeanResult, DatasetId, EncodedImage, ImageId, ManualResult};
use crate::remote::gateway::{AnalysisGateway, ImageStorage, UploadResponse};
use crate::remote::wire::{
    BlurParams, CategorizedMeanRequest, MeanLinesRequest, MeanLinesResponse, RawUploadResponse,
    StoredCategorizedResult, UploadForm, describe_error_body,
};

const OCTET_STREAM: &str = "application/octet-stream";

fn build_client(timeout: Duration) -> Result<reqwest::Client, AnalysisError> {
    let client = reqwest::Client::builder()
        .user_agent(format!("lumagrid/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Turn a non-success response into an [`AnalysisError::Remote`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = describe_error_body(status.as_u16(), &body);
    log::debug!("Request failed with {}: {}", status, message);
    Err(AnalysisError::remote(Some(status.as_u16()), message))
}

/// Read an encoded image body, falling back to sniffing the bytes when the
/// server sends no usable content type.
async fn read_image(response: reqwest::Response) -> Result<EncodedImage, AnalysisError> {
    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| v.starts_with("image/"));
    let bytes = response.bytes().await?.to_vec();
    let mime = header_mime.unwrap_or_else(|| {
        image::guess_format(&bytes)
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|_| OCTET_STREAM.to_string())
    });
    Ok(EncodedImage::new(mime, bytes))
}

/// HTTP client for the manual analysis endpoints.
#[derive(Clone, Debug)]
pub struct HttpAnalysisGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisGateway {
    /// Create a gateway for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a gateway from the server configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AnalysisError> {
        Self::new(config.analysis_url.clone(), config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    async fn compute_means(
        &self,
        image_id: ImageId,
        request: &MeanLinesRequest,
    ) -> Result<MeanLinesResponse, AnalysisError> {
        let url = self.url(&format!("/calculate-mean-lines/{}", image_id));
        log::debug!("POST {} {:?}", url, request);
        let response = check(self.http.post(&url).json(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn compute_categorized(
        &self,
        image_id: ImageId,
        request: &CategorizedMeanRequest,
    ) -> Result<CategorizedMeanResult, AnalysisError> {
        let url = self.url(&format!("/calculate-categorized-mean/{}", image_id));
        log::debug!(
            "POST {} ({} selected cells, {} categories)",
            url,
            request.selected_cells.len(),
            request.selection_categories.len()
        );
        let response = check(self.http.post(&url).json(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn existing_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<ManualResult>, AnalysisError> {
        let url = self.url(&format!("/result/{}", image_id));
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("No stored result for image {}", image_id);
            return Ok(None);
        }
        let response = check(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn categorized_result(
        &self,
        image_id: ImageId,
    ) -> Result<Option<CategorizedMeanResult>, AnalysisError> {
        let url = self.url(&format!("/categorized-mean/{}/result", image_id));
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check(response).await?;
        let body = response.text().await?;
        match serde_json::from_str::<StoredCategorizedResult>(&body) {
            Ok(stored) => Ok(stored.into_result()),
            Err(e) => {
                log::warn!("Ignoring malformed categorized result for image {}: {}", image_id, e);
                Ok(None)
            }
        }
    }

    async fn gaussian_blur(
        &self,
        image_id: ImageId,
        params: &BlurParams,
    ) -> Result<EncodedImage, AnalysisError> {
        let url = self.url(&format!("/gaussian-blur/{}", image_id));
        let response = check(self.http.post(&url).json(params).send().await?).await?;
        read_image(response).await
    }
}

/// HTTP client for the image storage endpoints.
#[derive(Clone, Debug)]
pub struct HttpImageStorage {
    http: reqwest::Client,
    base_url: String,
}

impl HttpImageStorage {
    /// Create a storage client for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AnalysisError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a storage client from the server configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AnalysisError> {
        Self::new(config.io_url.clone(), config.request_timeout())
    }
}

#[async_trait]
impl ImageStorage for HttpImageStorage {
    async fn upload(
        &self,
        dataset_id: DatasetId,
        file_name: &str,
        image: &EncodedImage,
        title: &str,
        description: &str,
    ) -> Result<UploadResponse, AnalysisError> {
        let url = format!("{}/image/upload", self.base_url);
        let form_data = serde_json::to_string(&UploadForm {
            title,
            dataset_id,
            description,
        })?;
        let file = Part::bytes(image.bytes.clone())
            .file_name(file_name.to_string())
            .mime_str(&image.mime)?;
        let form = Form::new().part("file", file).text("form_data", form_data);

        log::debug!("Uploading {} ({} bytes) to dataset {}", file_name, image.bytes.len(), dataset_id);
        let response = check(self.http.post(&url).multipart(form).send().await?).await?;
        let raw: RawUploadResponse = response.json().await?;
        Ok(UploadResponse {
            success: raw.success,
            message: raw.message,
            image_id: raw.data.and_then(|d| d.image_id),
        })
    }

    async fn download(&self, image_id: ImageId) -> Result<EncodedImage, AnalysisError> {
        let url = format!("{}/image/download-image/{}", self.base_url, image_id);
        let response = check(self.http.get(&url).send().await?).await?;
        read_image(response).await
    }
}
