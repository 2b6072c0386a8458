//! Configuration management for Slide Crop.
//!
//! This module provides the command-line configuration for the `slide-crop`
//! binary:
//! - Command-line arguments via clap
//! - Environment variables with `SLIDE_CROP_` prefix
//! - Defaults taken from the modules that own each setting
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use slide_crop::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Plan(config) => println!("planning {}", config.tiling.slide),
//!     Command::Run(config) => println!("cropping {}", config.tiling.slide),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `SLIDE_CROP_LEVEL` - Pyramid level (default: 0)
//! - `SLIDE_CROP_TILE_SIZE` - Output tile side (default: 512)
//! - `SLIDE_CROP_CROP_SCALE` - Crop side / tile side (default: 4)
//! - `SLIDE_CROP_OVERLAP_RATIO` - Overlap between neighbouring crops (default: 0.25)
//! - `SLIDE_CROP_BATCH_SIZE` - Crops per batch (default: 16)
//! - `SLIDE_CROP_COHORT_SIZE` - Batches per worker (default: 32)
//! - `SLIDE_CROP_MIN_LEVEL_SIZE` - Smallest synthesized pyramid level side (default: 256)
//! - `SLIDE_CROP_COHORTS_IN_FLIGHT` - Cohorts dispatched ahead by `run` (default: 1)

use clap::{Args, Parser, Subcommand};

use crate::driver::CropOptions;
use crate::grid::{DEFAULT_CROP_SCALE, DEFAULT_OVERLAP_RATIO, DEFAULT_TILE_SIZE};
use crate::schedule::{DEFAULT_BATCH_SIZE, DEFAULT_COHORT_SIZE};
use crate::slide::DEFAULT_MIN_LEVEL_SIZE;

// =============================================================================
// Default Values
// =============================================================================

/// Default pyramid level.
pub const DEFAULT_LEVEL: usize = 0;

/// Default number of cohorts the `run` command keeps dispatched.
pub const DEFAULT_COHORTS_IN_FLIGHT: usize = 1;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Slide Crop - overlapping crop grids for Whole Slide Images.
///
/// Plans a grid of overlapping crops over a slide and extracts them through
/// rotating slide workers.
#[derive(Parser, Debug, Clone)]
#[command(name = "slide-crop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Unwrap the selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the crop grid and batch layout as JSON without cropping.
    Plan(PlanConfig),

    /// Crop every tile of the slide through rotating workers.
    Run(RunConfig),
}

/// Slide and tiling options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct TilingArgs {
    /// Path of the slide (any raster image the backend can decode).
    #[arg(env = "SLIDE_CROP_SLIDE")]
    pub slide: String,

    /// Pyramid level to crop from (0 = full resolution).
    #[arg(long, default_value_t = DEFAULT_LEVEL, env = "SLIDE_CROP_LEVEL")]
    pub level: usize,

    /// Side of each output tile in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "SLIDE_CROP_TILE_SIZE")]
    pub tile_size: u32,

    /// Ratio between crop side and tile side.
    #[arg(long, default_value_t = DEFAULT_CROP_SCALE, env = "SLIDE_CROP_CROP_SCALE")]
    pub crop_scale: u32,

    /// Fraction of a crop shared with its neighbour, in [0, 1).
    #[arg(long, default_value_t = DEFAULT_OVERLAP_RATIO, env = "SLIDE_CROP_OVERLAP_RATIO")]
    pub overlap_ratio: f64,

    /// Number of crops per batch.
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE, env = "SLIDE_CROP_BATCH_SIZE")]
    pub batch_size: usize,

    /// Number of batches served by one worker before it is replaced.
    ///
    /// Larger values amortize slide opening; smaller values bound the state
    /// a single worker accumulates.
    #[arg(long, default_value_t = DEFAULT_COHORT_SIZE, env = "SLIDE_CROP_COHORT_SIZE")]
    pub cohort_size: usize,

    /// Smallest side of a synthesized pyramid level.
    #[arg(long, default_value_t = DEFAULT_MIN_LEVEL_SIZE, env = "SLIDE_CROP_MIN_LEVEL_SIZE")]
    pub min_level_size: u32,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl TilingArgs {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.slide.is_empty() {
            return Err("Slide path is required. Pass it as an argument or set SLIDE_CROP_SLIDE"
                .to_string());
        }

        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }
        if self.crop_scale == 0 {
            return Err("crop_scale must be greater than 0".to_string());
        }
        if self.tile_size.checked_mul(self.crop_scale).is_none() {
            return Err("tile_size * crop_scale is too large".to_string());
        }

        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err("overlap_ratio must be in [0, 1)".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.cohort_size == 0 {
            return Err("cohort_size must be greater than 0".to_string());
        }
        if self.min_level_size == 0 {
            return Err("min_level_size must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build driver options from the arguments.
    pub fn to_crop_options(&self) -> CropOptions {
        CropOptions::new(self.slide.clone())
            .with_level(self.level)
            .with_tile_size(self.tile_size)
            .with_crop_scale(self.crop_scale)
            .with_overlap_ratio(self.overlap_ratio)
            .with_cohort_size(self.cohort_size)
    }
}

/// Options for the `plan` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PlanConfig {
    #[command(flatten)]
    pub tiling: TilingArgs,

    /// Print single-line JSON instead of pretty-printed JSON.
    #[arg(long, default_value_t = false)]
    pub compact: bool,
}

impl PlanConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.tiling.validate()
    }
}

/// Options for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunConfig {
    #[command(flatten)]
    pub tiling: TilingArgs,

    /// Abort at the first failed tile instead of skipping it.
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Number of cohorts dispatched ahead of the one being resolved.
    ///
    /// 1 processes the slide strictly cohort by cohort.
    #[arg(long, default_value_t = DEFAULT_COHORTS_IN_FLIGHT, env = "SLIDE_CROP_COHORTS_IN_FLIGHT")]
    pub cohorts_in_flight: usize,
}

impl RunConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.tiling.validate()?;

        if self.cohorts_in_flight == 0 {
            return Err("cohorts_in_flight must be greater than 0".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
