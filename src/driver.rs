//! Slide crop driver.
//!
//! The driver is the entry point for callers. It queries the slide once for
//! its dimensions, plans the crop grid on demand and hands back the lazy
//! cohort sequence together with the total batch count, so progress can be
//! reported before any result is consumed.
//!
//! # Example
//!
//! ```ignore
//! use slide_crop::{CropOptions, ImageSlideBackend, SlideCropDriver};
//!
//! let options = CropOptions::new("scans/sample.png").with_tile_size(256);
//! let driver = SlideCropDriver::open(ImageSlideBackend::new(), options).await?;
//!
//! let (cohorts, total_batches) = driver.crop(16)?;
//! for cohort in cohorts {
//!     for batch in cohort.into_batches() {
//!         for result in batch.resolve().await {
//!             let crop = result?;
//!             println!("tile at {:?}", crop.position);
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::info;

use crate::error::{ConfigError, DriverError};
use crate::grid::{
    grid_shape, plan, SlideDimensions, TilingParameters, DEFAULT_CROP_SCALE,
    DEFAULT_OVERLAP_RATIO, DEFAULT_TILE_SIZE,
};
use crate::schedule::{BatchScheduler, CohortStream, DEFAULT_COHORT_SIZE};
use crate::slide::SlideBackend;
use crate::tile::{ImageResampler, Resampler};
use crate::worker::WorkerFactory;

// =============================================================================
// Crop Options
// =============================================================================

/// Options for a [`SlideCropDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct CropOptions {
    /// Resource locator resolved by the slide backend
    pub slide_path: String,

    /// Pyramid level every worker binds to (0 = full resolution)
    pub level: usize,

    /// Crop side divided by tile side
    pub crop_scale: u32,

    /// Output tile side in pixels
    pub tile_size: u32,

    /// Fraction of a crop shared with its neighbour, in `[0, 1)`
    pub overlap_ratio: f64,

    /// Batches served by one worker before it is replaced
    pub cohort_size: usize,
}

impl CropOptions {
    /// Create options for `slide_path` with default tiling.
    ///
    /// By default:
    /// - Level 0
    /// - Crop scale 4, tile size 512 (2048 pixel crops)
    /// - Overlap ratio 0.25
    /// - 32 batches per worker
    pub fn new(slide_path: impl Into<String>) -> Self {
        Self {
            slide_path: slide_path.into(),
            level: 0,
            crop_scale: DEFAULT_CROP_SCALE,
            tile_size: DEFAULT_TILE_SIZE,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            cohort_size: DEFAULT_COHORT_SIZE,
        }
    }

    /// Set the pyramid level.
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Set the crop scale.
    pub fn with_crop_scale(mut self, crop_scale: u32) -> Self {
        self.crop_scale = crop_scale;
        self
    }

    /// Set the output tile size.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the overlap ratio.
    pub fn with_overlap_ratio(mut self, overlap_ratio: f64) -> Self {
        self.overlap_ratio = overlap_ratio;
        self
    }

    /// Set how many batches one worker serves.
    pub fn with_cohort_size(mut self, cohort_size: usize) -> Self {
        self.cohort_size = cohort_size;
        self
    }

    /// Validate the tiling part of the options.
    pub fn tiling(&self) -> Result<TilingParameters, ConfigError> {
        TilingParameters::new(self.tile_size, self.crop_scale, self.overlap_ratio)
    }
}

// =============================================================================
// Crop Summary
// =============================================================================

/// Shape of a crop run, computed without dispatching anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropSummary {
    pub slide_path: String,
    pub level: usize,
    pub dimensions: SlideDimensions,
    /// `(height, width)` of the downsampled mosaic
    pub predicted_size: (u32, u32),
    pub tiling: TilingParameters,
    pub overlap_size: f64,
    pub non_overlap_size: f64,
    /// `(rows, cols)` of the planned grid
    pub grid: (usize, usize),
    pub coordinates: usize,
    pub batch_size: usize,
    pub batches: usize,
    pub cohort_size: usize,
    pub cohorts: usize,
}

// =============================================================================
// SlideCropDriver
// =============================================================================

/// Façade over grid planning and cohort dispatch for one slide.
pub struct SlideCropDriver<B: SlideBackend, R: Resampler = ImageResampler> {
    options: CropOptions,
    tiling: TilingParameters,
    dimensions: SlideDimensions,
    factory: WorkerFactory<B, R>,
}

impl<B: SlideBackend> SlideCropDriver<B, ImageResampler> {
    /// Open a driver with the default resampler.
    ///
    /// Must be called from within a tokio runtime; workers are spawned on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the dimensions worker cannot
    /// open the slide.
    pub async fn open(backend: B, options: CropOptions) -> Result<Self, DriverError> {
        Self::with_resampler(backend, ImageResampler::new(), options).await
    }
}

impl<B: SlideBackend, R: Resampler> SlideCropDriver<B, R> {
    /// Open a driver with a custom resampler.
    pub async fn with_resampler(
        backend: B,
        resampler: R,
        options: CropOptions,
    ) -> Result<Self, DriverError> {
        let tiling = options.tiling()?;
        if options.cohort_size == 0 {
            return Err(ConfigError::InvalidCohortSize.into());
        }

        let factory = WorkerFactory::new(
            Handle::current(),
            Arc::new(backend),
            Arc::new(resampler),
            options.slide_path.as_str(),
            options.level,
        );

        // The dimensions worker is dropped right after answering
        let dimensions = factory.spawn().dimensions().await?;

        info!(
            "Opened slide {} at level {}: {}x{} pixels, crop {} -> tile {}",
            options.slide_path,
            options.level,
            dimensions.width,
            dimensions.height,
            tiling.crop_size(),
            tiling.tile_size()
        );

        Ok(Self {
            options,
            tiling,
            dimensions,
            factory,
        })
    }

    /// Slide size at the bound level as `(height, width)`.
    pub fn original_size(&self) -> (u32, u32) {
        (self.dimensions.height, self.dimensions.width)
    }

    /// Mosaic size as `(height / crop_scale, width / crop_scale)`.
    pub fn predicted_size(&self) -> (u32, u32) {
        let scale = self.tiling.crop_scale();
        (
            self.dimensions.height / scale,
            self.dimensions.width / scale,
        )
    }

    /// Plan the grid and return the lazy cohort sequence with its batch count.
    ///
    /// The grid is recomputed on every call. No worker is spawned until the
    /// returned stream is advanced.
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` is zero or the crop does not fit in
    /// the slide.
    pub fn crop(&self, batch_size: usize) -> Result<(CohortStream<B, R>, usize), ConfigError> {
        let scheduler = BatchScheduler::new(batch_size, self.options.cohort_size)?;
        let coordinates = plan(
            self.dimensions,
            self.tiling.crop_size(),
            self.tiling.non_overlap_size(),
        )?;

        let stream = scheduler.stream(coordinates, self.tiling, self.factory.clone());
        let total_batches = stream.total_batches();
        Ok((stream, total_batches))
    }

    /// Describe what [`SlideCropDriver::crop`] would dispatch.
    pub fn summary(&self, batch_size: usize) -> Result<CropSummary, ConfigError> {
        let scheduler = BatchScheduler::new(batch_size, self.options.cohort_size)?;
        let non_overlap_size = self.tiling.non_overlap_size();
        let coordinates = plan(self.dimensions, self.tiling.crop_size(), non_overlap_size)?;
        let batches = scheduler.batch_count(coordinates.len());

        Ok(CropSummary {
            slide_path: self.options.slide_path.clone(),
            level: self.options.level,
            dimensions: self.dimensions,
            predicted_size: self.predicted_size(),
            tiling: self.tiling,
            overlap_size: self.tiling.overlap_size(),
            non_overlap_size,
            grid: grid_shape(self.dimensions, non_overlap_size),
            coordinates: coordinates.len(),
            batch_size,
            batches,
            cohort_size: scheduler.cohort_size(),
            cohorts: scheduler.cohort_count(batches),
        })
    }

    /// Slide dimensions at the bound level.
    pub fn dimensions(&self) -> SlideDimensions {
        self.dimensions
    }

    /// Validated tiling parameters.
    pub fn tiling(&self) -> &TilingParameters {
        &self.tiling
    }

    /// The options this driver was opened with.
    pub fn options(&self) -> &CropOptions {
        &self.options
    }

    /// Number of workers spawned so far, including the dimensions worker.
    pub fn workers_spawned(&self) -> usize {
        self.factory.spawned()
    }
}
