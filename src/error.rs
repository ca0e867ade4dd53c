//! Error types for settings parsing, region fetching and rendering.

use thiserror::Error;

/// A render setting that could not be turned into a usable number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Failure to produce the elevation region for a viewport.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Heightmap decode error
    #[error("failed to decode heightmap: {0}")]
    Image(#[from] image::ImageError),

    /// Crop rectangle empty or outside the raster
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// Source cannot serve the request
    #[error("elevation unavailable: {0}")]
    Unavailable(String),
}

/// Terminal error of a render pass. Cancellation is not an error.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
}
