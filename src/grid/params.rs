//! Tiling parameters and their derived crop geometry.

use serde::Serialize;

use crate::error::ConfigError;

/// Default output tile side in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 512;

/// Default ratio between crop side and tile side.
pub const DEFAULT_CROP_SCALE: u32 = 4;

/// Default fraction of a crop shared with its neighbour.
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.25;

// =============================================================================
// TilingParameters
// =============================================================================

/// Validated tiling configuration.
///
/// A crop of `crop_size = tile_size * crop_scale` pixels is read from the
/// slide and resampled down to `tile_size` pixels. Neighbouring crops share
/// `overlap_size = crop_size * overlap_ratio` pixels, so the grid advances by
/// `non_overlap_size = crop_size - overlap_size` pixels per step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TilingParameters {
    tile_size: u32,
    crop_scale: u32,
    overlap_ratio: f64,
    crop_size: u32,
}

impl TilingParameters {
    /// Validate and build tiling parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `tile_size` or `crop_scale` is zero
    /// - `tile_size * crop_scale` overflows
    /// - `overlap_ratio` is not in `[0, 1)`
    pub fn new(tile_size: u32, crop_scale: u32, overlap_ratio: f64) -> Result<Self, ConfigError> {
        if tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        if crop_scale == 0 {
            return Err(ConfigError::InvalidCropScale);
        }

        // A ratio of 1 would make the stride zero and the grid infinite
        if !(0.0..1.0).contains(&overlap_ratio) {
            return Err(ConfigError::InvalidOverlapRatio(overlap_ratio));
        }

        let crop_size = tile_size
            .checked_mul(crop_scale)
            .ok_or(ConfigError::CropSizeOverflow {
                tile_size,
                crop_scale,
            })?;

        Ok(Self {
            tile_size,
            crop_scale,
            overlap_ratio,
            crop_size,
        })
    }

    /// Output tile side in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Downsampling factor from crop to tile.
    pub fn crop_scale(&self) -> u32 {
        self.crop_scale
    }

    /// Fraction of a crop shared with its neighbour.
    pub fn overlap_ratio(&self) -> f64 {
        self.overlap_ratio
    }

    /// Side of the square region read from the slide.
    pub fn crop_size(&self) -> u32 {
        self.crop_size
    }

    /// Pixels shared by two neighbouring crops.
    pub fn overlap_size(&self) -> f64 {
        self.crop_size as f64 * self.overlap_ratio
    }

    /// Grid stride: distance between the origins of neighbouring crops.
    ///
    /// Always strictly positive for validated parameters.
    pub fn non_overlap_size(&self) -> f64 {
        self.crop_size as f64 - self.overlap_size()
    }
}

impl Default for TilingParameters {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            crop_scale: DEFAULT_CROP_SCALE,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            crop_size: DEFAULT_TILE_SIZE * DEFAULT_CROP_SCALE,
        }
    }
}
