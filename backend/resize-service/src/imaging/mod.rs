//! Image transformation core
//!
//! - `codec`: bytes <-> raster for the supported encoding families
//! - `resize`: fit-within and center-crop-to-fill resizing
//! - `budget`: quality search that fits encoded output under a byte ceiling
//!
//! Everything here is synchronous and CPU-bound. Async callers go through
//! `services::transform_blocking`, which runs it on the blocking pool.

pub mod budget;
pub mod codec;
pub mod resize;

pub use budget::{encode_with_budget, BudgetOutcome, EncodeSpec, EncodedArtifact};
pub use codec::{decode, encode, ImageFamily, RasterImage};
pub use resize::{resize, ResizeSpec};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode {family} image: {message}")]
    Encode { family: ImageFamily, message: String },

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Decode, resize and budget-encode one image, keeping its source family.
pub fn transform(data: &[u8], resize_spec: &ResizeSpec, encode_spec: &EncodeSpec) -> ImageResult<BudgetOutcome> {
    if resize_spec.is_noop() {
        return Err(ImageError::InvalidDimensions(
            "width and height cannot both be zero".to_string(),
        ));
    }

    let raster = decode(data)?;
    let family = raster.source_family();
    let resized = resize(raster, resize_spec)?;
    encode_with_budget(&resized, family, encode_spec)
}
