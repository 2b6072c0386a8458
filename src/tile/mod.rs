//! Tile production.
//!
//! Turns a raw RGBA crop into the fixed-size RGB tile placed in the
//! downsampled mosaic.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   strip_alpha   ┌─────────────┐   Resampler   ┌──────────────┐
//! │ RGBA crop    │ ──────────────▶ │ RGB crop    │ ────────────▶ │ f32 RGB tile │
//! │ crop_size²   │                 │ crop_size²  │               │ tile_size²   │
//! └──────────────┘                 └─────────────┘               └──────────────┘
//! ```
//!
//! # Components
//!
//! - [`strip_alpha`]: Discards the auxiliary alpha channel
//! - [`Resampler`]: Seam for the resampling routine
//! - [`ImageResampler`]: Default resampler, bilinear, range preserving

mod pixels;
mod resample;

pub use pixels::strip_alpha;
pub use resample::{ImageResampler, Resampler};

/// A resampled tile: RGB samples in the source `0..=255` range.
pub type Tile = image::Rgb32FImage;
