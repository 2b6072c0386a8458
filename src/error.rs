use thiserror::Error;

/// Errors raised synchronously when tiling or scheduling parameters are invalid.
///
/// These never depend on the slide backend: grid, batch and cohort
/// computation is pure and can only fail with this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Overlap ratio outside `[0, 1)` (or NaN)
    #[error("Invalid overlap ratio: {0} (must be in [0, 1))")]
    InvalidOverlapRatio(f64),

    /// Tile size of zero
    #[error("Invalid tile size: must be greater than 0")]
    InvalidTileSize,

    /// Crop scale of zero
    #[error("Invalid crop scale: must be greater than 0")]
    InvalidCropScale,

    /// `tile_size * crop_scale` does not fit in a pixel offset
    #[error("Crop size overflows: tile size {tile_size} x crop scale {crop_scale}")]
    CropSizeOverflow { tile_size: u32, crop_scale: u32 },

    /// The stride between neighbouring crops is not a positive finite number
    #[error("Invalid crop stride: {0}")]
    InvalidStride(f64),

    /// Batch size of zero
    #[error("Invalid batch size: must be greater than 0")]
    InvalidBatchSize,

    /// Cohort size of zero
    #[error("Invalid cohort size: must be greater than 0")]
    InvalidCohortSize,

    /// The stride is so small that the grid would not fit in memory
    #[error("Crop grid too large: {rows} rows x {cols} cols (limit {limit} coordinates)")]
    GridTooLarge {
        rows: usize,
        cols: usize,
        limit: usize,
    },

    /// The crop does not fit inside the slide
    #[error("Crop size {crop_size} exceeds slide dimensions {width}x{height}")]
    CropExceedsSlide {
        crop_size: u32,
        width: u32,
        height: u32,
    },
}

/// Errors produced by crop workers.
///
/// Backend-dependent failures are deferred: they surface when the caller
/// resolves the pending handle of the affected task. The type is `Clone`
/// because a single open failure is reported to every task bound to the
/// worker that hit it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropError {
    /// The backend could not open the slide
    #[error("Failed to open slide {path}: {message}")]
    SlideOpen { path: String, message: String },

    /// The worker was bound to a pyramid level the slide does not have
    #[error("Level {level} out of range (slide has {levels} levels)")]
    LevelOutOfRange { level: usize, levels: usize },

    /// A region read failed (out of range or corrupt data)
    #[error("Failed to read {width}x{height} region at ({x}, {y}): {message}")]
    RegionRead {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        message: String,
    },

    /// Resampling the region to the tile size failed
    #[error("Resample error: {message}")]
    Resample { message: String },

    /// The worker went away before answering
    #[error("Worker terminated before answering the request")]
    WorkerLost,
}

/// Errors returned when constructing a [`crate::SlideCropDriver`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Invalid crop options
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The dimensions worker could not report the slide dimensions
    #[error("Crop error: {0}")]
    Crop(#[from] CropError),
}
