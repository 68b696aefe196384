//! Error types for grid analysis operations.

use std::path::PathBuf;

use crate::model::ImageId;
use thiserror::Error;

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: document, image payload or dimensions.
    Validation,
    /// Local state does not allow the operation yet.
    State,
    /// Transport failure while talking to a remote service.
    Network,
    /// The remote service answered with an explicit failure.
    RemoteComputation,
    /// Local filesystem or archive failure.
    Io,
}

/// Errors that can occur during grid analysis operations.
///
/// A missing server result is not an error: lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image dimensions with a zero extent
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },

    /// Markup document could not be parsed or its embedded image decoded
    #[error("Malformed markup: {message}")]
    MalformedMarkup {
        /// Description of the problem
        message: String,
    },

    /// Image bytes could not be decoded to read their dimensions
    #[error("Failed to determine image dimensions: {message}")]
    DimensionProbeFailed {
        /// Decoder error message
        message: String,
    },

    /// Operation needs image dimensions that were never captured
    #[error("Image dimensions not available for image {image_id}")]
    DimensionsUnavailable {
        /// The image without dimensions
        image_id: ImageId,
    },

    /// Operation needs at least one line per orientation
    #[error("Lines not configured for image {image_id}")]
    LinesNotConfigured {
        /// The image without lines
        image_id: ImageId,
    },

    /// Operation needs a server result with brightness data
    #[error("No brightness data available for image {image_id}")]
    NoBrightnessData {
        /// The image without a result
        image_id: ImageId,
    },

    /// Export needs an image that is not cached in the analysis state
    #[error("No cached {which} image for image {image_id}")]
    MissingCachedImage {
        /// Which image is missing ("original" or "blurred")
        which: &'static str,
        /// The image id
        image_id: ImageId,
    },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service reported a failure
    #[error("{message}")]
    Remote {
        /// HTTP status, when the failure came with one
        status: Option<u16>,
        /// Message extracted from the response
        message: String,
    },

    /// The remote service answered with a body we could not understand
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Image storage refused to create the image
    #[error("Failed to create image in dataset: {message}")]
    Upload {
        /// Message returned by the storage service
        message: String,
    },

    /// I/O error during file operations
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Create a malformed markup error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            message: message.into(),
        }
    }

    /// Create a dimension decoding error with a message.
    pub fn dimension_probe(message: impl Into<String>) -> Self {
        Self::DimensionProbeFailed {
            message: message.into(),
        }
    }

    /// Create a remote computation error.
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDimensions { .. }
            | Self::MalformedMarkup { .. }
            | Self::DimensionProbeFailed { .. }
            | Self::Json(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::DimensionsUnavailable { .. }
            | Self::LinesNotConfigured { .. }
            | Self::NoBrightnessData { .. }
            | Self::MissingCachedImage { .. } => ErrorKind::State,
            Self::Network(_) => ErrorKind::Network,
            Self::Remote { .. } | Self::InvalidResponse(_) | Self::Upload { .. } => {
                ErrorKind::RemoteComputation
            }
            Self::Io { .. } | Self::Zip(_) => ErrorKind::Io,
        }
    }

    /// Whether this is a validation error.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Short message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check the connection to the server.".to_string(),
            Self::Remote {
                status: Some(404), ..
            } => "Result not found.".to_string(),
            Self::Remote {
                status: Some(status),
                ..
            } if *status >= 500 => "Internal server error.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
