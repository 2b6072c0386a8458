//! Overlapping crop grid computation.
//!
//! The planner deliberately overestimates the number of rows and columns by
//! two and clamps every out-of-range candidate back onto the slide edge. This
//! guarantees full coverage and a final row/column flush with the boundary,
//! at the cost of repeated coordinates when a dimension divides evenly by the
//! stride. Those duplicates are kept.
//!
//! ```text
//!   x=0     x=s     x=2s    x=W-c
//!   ┌───────┬─┬─────┬─┬─────┬┬──────┐
//!   │       │ │     │ │     ││      │
//!   │ crop  │o│     │o│     ││ edge │  s = non-overlap stride
//!   │       │ │     │ │     ││ crop │  o = overlap
//!   └───────┴─┴─────┴─┴─────┴┴──────┘  c = crop size
//! ```

use serde::Serialize;

use crate::error::ConfigError;

// =============================================================================
// Types
// =============================================================================

/// Pixel extent of a slide at one pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlideDimensions {
    pub width: u32,
    pub height: u32,
}

impl SlideDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for SlideDimensions {
    /// Converts a backend `(width, height)` pair.
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Top-left offset of one square crop region.
///
/// Coordinates are ordered `(y, x)` to match the row-major planning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CropCoordinate {
    pub y: u32,
    pub x: u32,
}

impl CropCoordinate {
    pub fn new(y: u32, x: u32) -> Self {
        Self { y, x }
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Largest number of coordinates a single plan may hold.
pub const MAX_GRID_LEN: usize = 1 << 24;

/// Number of `(rows, cols)` the planner iterates over.
///
/// This is `floor(extent / stride) + 2` on each axis, saturating at
/// `usize::MAX` for degenerate strides.
pub fn grid_shape(dimensions: SlideDimensions, non_overlap_size: f64) -> (usize, usize) {
    let steps = |extent: u32| {
        // Float to integer casts saturate
        ((extent as f64 / non_overlap_size).floor() as usize).saturating_add(2)
    };
    (steps(dimensions.height), steps(dimensions.width))
}

/// Number of coordinates [`plan`] returns for these inputs, duplicates included.
///
/// # Errors
///
/// Returns [`ConfigError::GridTooLarge`] if the grid holds more than
/// [`MAX_GRID_LEN`] coordinates.
pub fn planned_len(
    dimensions: SlideDimensions,
    non_overlap_size: f64,
) -> Result<usize, ConfigError> {
    let (rows, cols) = grid_shape(dimensions, non_overlap_size);
    rows.checked_mul(cols)
        .filter(|&len| len <= MAX_GRID_LEN)
        .ok_or(ConfigError::GridTooLarge {
            rows,
            cols,
            limit: MAX_GRID_LEN,
        })
}

/// Compute the full, row-major list of crop coordinates covering a slide.
///
/// # Arguments
///
/// * `dimensions` - Slide extent at the bound level
/// * `crop_size` - Side of each square crop
/// * `non_overlap_size` - Stride between neighbouring crop origins
///
/// # Errors
///
/// Returns an error if the stride is not a positive finite number, if the
/// crop does not fit inside the slide (a clamp would otherwise produce a
/// negative offset), or if the grid exceeds [`MAX_GRID_LEN`] coordinates.
pub fn plan(
    dimensions: SlideDimensions,
    crop_size: u32,
    non_overlap_size: f64,
) -> Result<Vec<CropCoordinate>, ConfigError> {
    if !non_overlap_size.is_finite() || non_overlap_size <= 0.0 {
        return Err(ConfigError::InvalidStride(non_overlap_size));
    }

    let SlideDimensions { width, height } = dimensions;
    if crop_size == 0 || crop_size > width || crop_size > height {
        return Err(ConfigError::CropExceedsSlide {
            crop_size,
            width,
            height,
        });
    }

    let len = planned_len(dimensions, non_overlap_size)?;
    let (rows, cols) = grid_shape(dimensions, non_overlap_size);
    let mut coordinates = Vec::with_capacity(len);

    for i in 0..rows {
        let y = clamp_axis(i as f64 * non_overlap_size, crop_size, height);
        for j in 0..cols {
            let x = clamp_axis(j as f64 * non_overlap_size, crop_size, width);
            coordinates.push(CropCoordinate { y, x });
        }
    }

    Ok(coordinates)
}

/// Pull a candidate offset back so the crop ends on the slide edge.
#[inline]
fn clamp_axis(candidate: f64, crop_size: u32, extent: u32) -> u32 {
    let offset = if candidate + crop_size as f64 > extent as f64 {
        (extent - crop_size) as f64
    } else {
        candidate.max(0.0)
    };
    offset as u32
}

// =============================================================================
// Tests
// =============================================================================
