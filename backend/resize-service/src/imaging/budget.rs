//! Budget-fitting encoder
//!
//! Encodes at the requested quality, then walks quality down in fixed steps
//! until the output fits `max_size_kb * 1024` bytes or the floor is reached.
//! Lossy quality/size curves are not smooth, so this is a bounded linear walk
//! rather than a bisection.

use super::codec::{encode, ImageFamily, RasterImage};
use super::{ImageError, ImageResult};
use bytes::Bytes;
use tracing::debug;

pub const DEFAULT_QUALITY: u8 = 85;
pub const QUALITY_STEP: u8 = 5;
pub const QUALITY_FLOOR: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSpec {
    quality: u8,
    max_size_kb: u32,
}

impl Default for EncodeSpec {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_size_kb: 0,
        }
    }
}

impl EncodeSpec {
    /// Build from caller-supplied integers: quality 1..=100, max size >= 0 (0 = unlimited).
    pub fn new(quality: i64, max_size_kb: i64) -> ImageResult<Self> {
        if !(1..=100).contains(&quality) {
            return Err(ImageError::InvalidParameters(format!(
                "quality must be between 1 and 100 (got {quality})"
            )));
        }
        let max_size_kb = u32::try_from(max_size_kb).map_err(|_| {
            ImageError::InvalidParameters(format!(
                "max_size_kb must be a non-negative 32-bit value (got {max_size_kb})"
            ))
        })?;

        Ok(Self {
            quality: quality as u8,
            max_size_kb,
        })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn max_size_kb(&self) -> u32 {
        self.max_size_kb
    }

    /// Byte ceiling, or `None` when unconstrained.
    pub fn max_size_bytes(&self) -> Option<usize> {
        (self.max_size_kb > 0).then(|| self.max_size_kb as usize * 1024)
    }

    /// Whether an encoding of `len` bytes satisfies the budget. The ceiling is inclusive.
    pub fn fits(&self, len: usize) -> bool {
        self.max_size_bytes().map_or(true, |budget| len <= budget)
    }
}

/// Encoded output of one pipeline run.
#[derive(Clone, Debug)]
pub struct EncodedArtifact {
    pub bytes: Bytes,
    pub family: ImageFamily,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

impl EncodedArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        self.family.content_type()
    }
}

/// Result of a budgeted encode.
#[derive(Clone, Debug)]
pub enum BudgetOutcome {
    /// Within budget, or no budget was requested.
    Fits(EncodedArtifact),
    /// Over budget: floor quality reached, or the family has no quality knob.
    /// The smallest artifact produced is returned.
    BestEffort(EncodedArtifact),
}

impl BudgetOutcome {
    pub fn artifact(&self) -> &EncodedArtifact {
        match self {
            BudgetOutcome::Fits(artifact) | BudgetOutcome::BestEffort(artifact) => artifact,
        }
    }

    pub fn into_artifact(self) -> EncodedArtifact {
        match self {
            BudgetOutcome::Fits(artifact) | BudgetOutcome::BestEffort(artifact) => artifact,
        }
    }

    pub fn budget_met(&self) -> bool {
        matches!(self, BudgetOutcome::Fits(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetOutcome::Fits(_) => "fits",
            BudgetOutcome::BestEffort(_) => "best_effort",
        }
    }
}

/// Qualities tried for a search starting at `start`: `start`, then down by
/// [`QUALITY_STEP`], ending exactly at [`QUALITY_FLOOR`]. A start at or below
/// the floor yields only itself.
pub fn quality_steps(start: u8) -> impl Iterator<Item = u8> {
    std::iter::successors(Some(start), |&quality| {
        (quality > QUALITY_FLOOR).then(|| quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR))
    })
}

/// Encode `raster` as `family`, fitting under the size budget in `spec` when one
/// applies. PNG and GIF have no quality knob: they are encoded once and the
/// result is only checked against the budget.
pub fn encode_with_budget(
    raster: &RasterImage,
    family: ImageFamily,
    spec: &EncodeSpec,
) -> ImageResult<BudgetOutcome> {
    let first = encode_artifact(raster, family, spec.quality)?;

    let Some(budget) = spec.max_size_bytes() else {
        return Ok(BudgetOutcome::Fits(first));
    };

    if spec.fits(first.len()) {
        return Ok(BudgetOutcome::Fits(first));
    }

    if !family.supports_quality() {
        debug!(
            %family,
            size = first.len(),
            budget,
            "Size budget not enforceable for lossless family"
        );
        return Ok(BudgetOutcome::BestEffort(first));
    }

    let mut smallest = first;
    for quality in quality_steps(spec.quality).skip(1) {
        let candidate = encode_artifact(raster, family, quality)?;
        debug!(
            quality,
            size = candidate.len(),
            budget,
            "Size budget search step"
        );

        if spec.fits(candidate.len()) {
            return Ok(BudgetOutcome::Fits(candidate));
        }
        smallest = candidate;
    }

    debug!(
        quality = smallest.quality,
        size = smallest.len(),
        budget,
        "Size budget unreachable, returning floor quality"
    );
    Ok(BudgetOutcome::BestEffort(smallest))
}

fn encode_artifact(raster: &RasterImage, family: ImageFamily, quality: u8) -> ImageResult<EncodedArtifact> {
    let bytes = encode(raster, family, quality)?;
    Ok(EncodedArtifact {
        bytes,
        family,
        quality,
        width: raster.width(),
        height: raster.height(),
    })
}
