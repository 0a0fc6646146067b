//! Resize engine
//!
//! Two policies:
//! - fit: uniform scale so the image fits within the requested box; a zero
//!   dimension is derived from the source aspect ratio.
//! - fill: scale to cover the box, then crop symmetrically from the center so
//!   the output is exactly `width x height`.
//!
//! Resampling always uses Lanczos3.

use super::codec::RasterImage;
use super::{ImageError, ImageResult};
use image::imageops::FilterType;
use tracing::debug;

/// Largest accepted dimension in either axis, requested or derived
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest accepted output (or intermediate) raster, in pixels
pub const MAX_PIXELS: u64 = 100_000_000;

const FILTER: FilterType = FilterType::Lanczos3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeSpec {
    width: u32,
    height: u32,
    fill: bool,
}

impl ResizeSpec {
    /// Build from caller-supplied integers. Zero means "derive from aspect ratio".
    pub fn new(width: i64, height: i64, fill: bool) -> ImageResult<Self> {
        Ok(Self {
            width: checked_dimension("width", width)?,
            height: checked_dimension("height", height)?,
            fill,
        })
    }

    /// Aspect-preserving fit within `width x height`
    pub fn fit(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: false,
        }
    }

    /// Center-crop-to-fill `width x height`
    pub fn fill(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_fill(&self) -> bool {
        self.fill
    }

    /// Both dimensions zero: nothing to resize to.
    pub fn is_noop(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

fn checked_dimension(name: &str, value: i64) -> ImageResult<u32> {
    if value < 0 {
        return Err(ImageError::InvalidDimensions(format!(
            "{name} must not be negative (got {value})"
        )));
    }
    if value > i64::from(MAX_DIMENSION) {
        return Err(ImageError::InvalidDimensions(format!(
            "{name} must not exceed {MAX_DIMENSION} (got {value})"
        )));
    }
    Ok(value as u32)
}

/// Resize a raster according to `spec`.
///
/// A spec with both dimensions zero returns the image unchanged; pipelines
/// reject such requests before they get here. Fails with `InvalidDimensions`
/// when the output (or the intermediate cover scale of a fill) would exceed
/// [`MAX_DIMENSION`] per axis or [`MAX_PIXELS`] in total.
pub fn resize(raster: RasterImage, spec: &ResizeSpec) -> ImageResult<RasterImage> {
    let source = raster.dimensions();
    if spec.is_noop() || source.0 == 0 || source.1 == 0 {
        return Ok(raster);
    }

    let family = raster.source_family();
    let image = raster.as_dynamic();

    if spec.fill && spec.width > 0 && spec.height > 0 {
        let target = (spec.width, spec.height);
        if source == target {
            return Ok(raster);
        }

        let (cover_w, cover_h) = cover_dimensions(source, target)?;
        let x = (cover_w - target.0) / 2;
        let y = (cover_h - target.1) / 2;
        debug!(
            source_width = source.0,
            source_height = source.1,
            cover_width = cover_w,
            cover_height = cover_h,
            crop_x = x,
            crop_y = y,
            "Resizing to fill"
        );

        let scaled = image.resize_exact(cover_w, cover_h, FILTER);
        let cropped = scaled.crop_imm(x, y, target.0, target.1);
        return Ok(RasterImage::new(cropped, family));
    }

    let (width, height) = fit_dimensions(source, (spec.width, spec.height))?;
    if (width, height) == source {
        return Ok(raster);
    }

    debug!(
        source_width = source.0,
        source_height = source.1,
        width,
        height,
        "Resizing to fit"
    );
    Ok(RasterImage::new(
        image.resize_exact(width, height, FILTER),
        family,
    ))
}

/// Reject output sizes that are too large to allocate safely.
fn check_dimensions(width: u64, height: u64) -> ImageResult<(u32, u32)> {
    let max = u64::from(MAX_DIMENSION);
    if width > max || height > max {
        return Err(ImageError::InvalidDimensions(format!(
            "output {width}x{height} exceeds {MAX_DIMENSION} pixels per side"
        )));
    }
    let pixels = width * height;
    if pixels > MAX_PIXELS {
        return Err(ImageError::InvalidDimensions(format!(
            "output {width}x{height} exceeds {MAX_PIXELS} pixels"
        )));
    }

    let narrow = |v: u64| {
        u32::try_from(v).map_err(|_| ImageError::InvalidDimensions(format!("{v} out of range")))
    };
    Ok((narrow(width)?, narrow(height)?))
}

/// Dimensions of a uniform scale of `source` that fits within `bounds`.
/// A zero bound is unconstrained and derived from the aspect ratio.
pub fn fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> ImageResult<(u32, u32)> {
    let (src_w, src_h) = (u64::from(source.0), u64::from(source.1));

    match bounds {
        (0, 0) => Ok(source),
        (width, 0) => {
            let width = u64::from(width);
            let height = rounded_div(src_h * width, src_w).max(1);
            check_dimensions(width, height)
        }
        (0, height) => {
            let height = u64::from(height);
            let width = rounded_div(src_w * height, src_h).max(1);
            check_dimensions(width, height)
        }
        (width, height) => {
            let ratio = (f64::from(width) / src_w as f64).min(f64::from(height) / src_h as f64);
            let fit_w = ((src_w as f64 * ratio).round() as u64).clamp(1, u64::from(width));
            let fit_h = ((src_h as f64 * ratio).round() as u64).clamp(1, u64::from(height));
            check_dimensions(fit_w, fit_h)
        }
    }
}

/// `numerator / denominator`, rounded half up
fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Smallest uniform scale of `source` that covers `target` in both axes.
fn cover_dimensions(source: (u32, u32), target: (u32, u32)) -> ImageResult<(u32, u32)> {
    let (src_w, src_h) = (u64::from(source.0), u64::from(source.1));
    let (dst_w, dst_h) = (u64::from(target.0), u64::from(target.1));

    if dst_w * src_h >= dst_h * src_w {
        // width binds; height overflows and is cropped
        let height = (src_h * dst_w).div_ceil(src_w);
        check_dimensions(dst_w, height.max(dst_h))
    } else {
        let width = (src_w * dst_h).div_ceil(src_h);
        check_dimensions(width.max(dst_w), dst_h)
    }
}
