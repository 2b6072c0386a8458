//! Local raster backend.
//!
//! Opens any raster file the `image` crate can decode (JPEG, PNG, TIFF) and
//! synthesizes a power-of-two pyramid from it, so a plain image behaves like
//! a multi-resolution slide. The whole pyramid is held in memory for the
//! lifetime of the handle, which makes this backend suited to tests, demos
//! and moderately sized scans rather than true gigapixel slides.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;

use crate::error::CropError;

use super::backend::{SlideBackend, SlideHandle};

/// Smallest side a synthesized pyramid level may have.
pub const DEFAULT_MIN_LEVEL_SIZE: u32 = 256;

// =============================================================================
// ImageSlideBackend
// =============================================================================

/// Backend that opens local raster files.
///
/// # Example
///
/// ```ignore
/// use slide_crop::slide::{ImageSlideBackend, SlideBackend};
///
/// let backend = ImageSlideBackend::new();
/// let slide = backend.open("scans/sample.png").await?;
/// println!("{} levels", slide.level_count());
/// ```
#[derive(Debug, Clone)]
pub struct ImageSlideBackend {
    min_level_size: u32,
}

impl ImageSlideBackend {
    /// Create a backend with the default pyramid floor.
    pub fn new() -> Self {
        Self {
            min_level_size: DEFAULT_MIN_LEVEL_SIZE,
        }
    }

    /// Create a backend that stops halving once a level side would drop
    /// below `min_level_size`.
    pub fn with_min_level_size(min_level_size: u32) -> Self {
        Self {
            min_level_size: min_level_size.max(1),
        }
    }
}

impl Default for ImageSlideBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlideBackend for ImageSlideBackend {
    type Handle = ImageSlide;

    async fn open(&self, path: &str) -> Result<Self::Handle, CropError> {
        if !Path::new(path).is_file() {
            return Err(CropError::SlideOpen {
                path: path.to_string(),
                message: "no such file".to_string(),
            });
        }

        let owned = path.to_string();
        let min_level_size = self.min_level_size;

        // Decoding and pyramid synthesis are CPU bound
        tokio::task::spawn_blocking(move || ImageSlide::load(&owned, min_level_size))
            .await
            .map_err(|e| CropError::SlideOpen {
                path: path.to_string(),
                message: e.to_string(),
            })?
    }
}

// =============================================================================
// ImageSlide
// =============================================================================

/// An in-memory pyramid built from a single raster image.
#[derive(Debug, Clone)]
pub struct ImageSlide {
    identifier: String,
    levels: Arc<Vec<RgbaImage>>,
}

impl ImageSlide {
    /// Decode `path` and build its pyramid.
    pub fn load(path: &str, min_level_size: u32) -> Result<Self, CropError> {
        let decoded = image::open(path).map_err(|e| CropError::SlideOpen {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self::from_image(path, decoded.into_rgba8(), min_level_size))
    }

    /// Build a pyramid from an already decoded base level.
    pub fn from_image(identifier: impl Into<String>, base: RgbaImage, min_level_size: u32) -> Self {
        let identifier = identifier.into();
        let mut levels = vec![base];

        while let Some(next) = levels.last().and_then(|prev| half_level(prev, min_level_size)) {
            levels.push(next);
        }

        debug!(
            slide = %identifier,
            levels = levels.len(),
            "Built image pyramid"
        );

        Self {
            identifier,
            levels: Arc::new(levels),
        }
    }

    /// Identifier of the source image.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Halve a level, or `None` once the result would be below the floor.
fn half_level(prev: &RgbaImage, min_level_size: u32) -> Option<RgbaImage> {
    let width = prev.width() / 2;
    let height = prev.height() / 2;
    if width.min(height) < min_level_size.max(1) {
        return None;
    }
    Some(imageops::resize(prev, width, height, FilterType::Triangle))
}

#[async_trait]
impl SlideHandle for ImageSlide {
    fn level_count(&self) -> usize {
        self.levels.len()
    }

    fn level_dimensions(&self, level: usize) -> Option<(u32, u32)> {
        self.levels.get(level).map(|img| img.dimensions())
    }

    fn level_downsample(&self, level: usize) -> Option<f64> {
        if level < self.levels.len() {
            Some(f64::from(1u32 << level.min(31)))
        } else {
            None
        }
    }

    async fn read_region(
        &self,
        origin: (u32, u32),
        level: usize,
        size: (u32, u32),
    ) -> Result<RgbaImage, CropError> {
        let (width, height) = size;
        let downsample = self.level_downsample(level).unwrap_or(1.0);
        let x = (origin.0 as f64 / downsample).round() as u32;
        let y = (origin.1 as f64 / downsample).round() as u32;

        let region_error = |message: String| CropError::RegionRead {
            x,
            y,
            width,
            height,
            message,
        };

        let (level_width, level_height) = self
            .level_dimensions(level)
            .ok_or_else(|| region_error(format!("level {} does not exist", level)))?;

        if width == 0 || height == 0 {
            return Err(region_error("empty region".to_string()));
        }
        if u64::from(x) + u64::from(width) > u64::from(level_width)
            || u64::from(y) + u64::from(height) > u64::from(level_height)
        {
            return Err(region_error(format!(
                "region exceeds level bounds {}x{}",
                level_width, level_height
            )));
        }

        let levels = Arc::clone(&self.levels);
        tokio::task::spawn_blocking(move || {
            imageops::crop_imm(&levels[level], x, y, width, height).to_image()
        })
        .await
        .map_err(|e| region_error(e.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
