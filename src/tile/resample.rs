//! Crop resampling.
//!
//! A crop of `crop_size` pixels is scaled down to `tile_size` pixels before
//! it is handed to the mosaic consumer.
//!
//! # Design Decisions
//!
//! - **Value range preserved**: Output samples are `f32` in the same
//!   `0..=255` range as the 8-bit source. Nothing is normalized to `[0, 1]`
//!   in the returned tile.
//!
//! - **Bilinear by default**: The default filter is a triangle (bilinear)
//!   kernel, which never overshoots the source range.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::error::CropError;

use super::Tile;

// =============================================================================
// Resampler Trait
// =============================================================================

/// Rescales an RGB crop to the output tile size.
///
/// Implementations run on tokio's blocking pool and must be shareable across
/// workers.
pub trait Resampler: Send + Sync + 'static {
    /// Resize `region` to `size = (width, height)`.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::Resample`] for degenerate target or source sizes.
    fn resize(&self, region: &RgbImage, size: (u32, u32)) -> Result<Tile, CropError>;
}

// =============================================================================
// ImageResampler
// =============================================================================

/// Default [`Resampler`] backed by `image::imageops::resize`.
#[derive(Debug, Clone, Copy)]
pub struct ImageResampler {
    filter: FilterType,
}

impl ImageResampler {
    /// Create a resampler with the bilinear filter.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Create a resampler with a specific filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// The configured filter.
    pub fn filter(&self) -> FilterType {
        self.filter
    }
}

impl Default for ImageResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for ImageResampler {
    fn resize(&self, region: &RgbImage, size: (u32, u32)) -> Result<Tile, CropError> {
        let (width, height) = size;
        if width == 0 || height == 0 {
            return Err(CropError::Resample {
                message: format!("degenerate target size {}x{}", width, height),
            });
        }
        if region.width() == 0 || region.height() == 0 {
            return Err(CropError::Resample {
                message: "empty source region".to_string(),
            });
        }

        // imageops clamps float samples to [0, 1], so resample in the
        // normalized domain and scale back to the 8-bit range afterwards.
        let normalized = DynamicImage::ImageRgb8(region.clone()).into_rgb32f();
        let mut tile = imageops::resize(&normalized, width, height, self.filter);
        let max = f32::from(u8::MAX);
        for sample in tile.iter_mut() {
            *sample *= max;
        }

        Ok(tile)
    }
}

// =============================================================================
// Tests
// =============================================================================
