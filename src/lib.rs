//! # Slide Crop
//!
//! Plans overlapping crop grids over Whole Slide Images (WSI) and dispatches
//! crop extraction across rotating, stateful slide workers.
//!
//! A gigapixel slide is far too large to process in one piece. This library
//! covers it with square, overlapping crops, reads each crop through a
//! decoding backend, resamples it to a fixed tile size and reports where the
//! tile belongs in a downsampled mosaic.
//!
//! ## Features
//!
//! - **Full coverage grid**: Overestimate-then-clamp planning keeps every edge
//!   crop flush with the slide boundary
//! - **Rotating workers**: Each cohort of batches gets a fresh worker, bounding
//!   per-worker state while amortizing slide open costs
//! - **Lazy dispatch**: Workers are spawned and crops submitted only when the
//!   caller pulls the next cohort
//! - **Deferred failures**: Backend errors surface per task when a pending
//!   result is resolved, never affecting sibling tasks
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`grid`] - Tiling parameters and crop grid planning
//! - [`schedule`] - Batch/cohort partitioning and the lazy cohort stream
//! - [`worker`] - Crop worker actors and pending results
//! - [`slide`] - Decoding backend traits and a local raster backend
//! - [`tile`] - Alpha stripping and resampling
//! - [`driver`] - The [`SlideCropDriver`] façade
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use slide_crop::{CropOptions, ImageSlideBackend, SlideCropDriver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = CropOptions::new("scans/sample.png")
//!         .with_tile_size(256)
//!         .with_crop_scale(2);
//!
//!     let driver = SlideCropDriver::open(ImageSlideBackend::new(), options)
//!         .await
//!         .expect("slide should open");
//!
//!     let (cohorts, total_batches) = driver.crop(16).expect("valid batch size");
//!     println!("{} batches to process", total_batches);
//!
//!     for cohort in cohorts {
//!         for batch in cohort.into_batches() {
//!             let tiles = batch.resolve().await;
//!             println!("{} tiles", tiles.len());
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod schedule;
pub mod slide;
pub mod tile;
pub mod worker;

// Re-export commonly used types
pub use config::{Cli, Command, PlanConfig, RunConfig, TilingArgs};
pub use driver::{CropOptions, CropSummary, SlideCropDriver};
pub use error::{ConfigError, CropError, DriverError};
pub use grid::{
    grid_shape, plan, planned_len, CropCoordinate, SlideDimensions, TilingParameters,
    DEFAULT_CROP_SCALE, DEFAULT_OVERLAP_RATIO, DEFAULT_TILE_SIZE, MAX_GRID_LEN,
};
pub use schedule::{
    Batch, BatchScheduler, Cohort, CohortStream, DEFAULT_BATCH_SIZE, DEFAULT_COHORT_SIZE,
};
pub use slide::{ImageSlide, ImageSlideBackend, SlideBackend, SlideHandle};
pub use tile::{strip_alpha, ImageResampler, Resampler, Tile};
pub use worker::{
    resolve_all, CropResult, CropTask, CropWorker, MosaicPosition, Pending, WorkerFactory,
};
