//! Remote analysis service and image storage.
//!
//! The session and importer talk to the outside world only through
//! [`AnalysisGateway`] and [`ImageStorage`]; [`http`] implements both against
//! the REST API.

mod gateway;
pub mod http;
pub mod wire;

pub use gateway::{AnalysisGateway, ImageStorage, UploadResponse};
pub use http::{HttpAnalysisGateway, HttpImageStorage};
pub use wire::{BlurParams, CategorizedMeanRequest, MeanLinesRequest, MeanLinesResponse};
