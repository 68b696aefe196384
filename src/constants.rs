//! Global constants for grid analysis

/// Default analysis service endpoint
pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8000/api/v1/analysis/manual";

/// Default image storage endpoint
pub const DEFAULT_IO_URL: &str = "http://localhost:8000/api/v1/IO";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Relative positions of the lines created for an image without any
pub const DEFAULT_LINE_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Cell width reported when image dimensions are unknown
pub const DEFAULT_X_BLOCK_SIZE: u32 = 18;

/// Cell height reported when image dimensions are unknown
pub const DEFAULT_Y_BLOCK_SIZE: u32 = 16;

/// Gaussian blur kernel size requested from the analysis service
pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 3;

/// File extension of markup documents
pub const MARKUP_EXTENSION: &str = "json";

/// Upper bound on the buffer reserved up front for one archive entry
pub const MAX_ENTRY_PREALLOC: usize = 64 * 1024 * 1024;
