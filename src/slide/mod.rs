//! Slide decoding backends.
//!
//! Crop workers talk to slides exclusively through the traits defined here,
//! which keeps the scheduling core independent of any file format.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               CropWorker                │
//! │      (owns exactly one open handle)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           SlideHandle Trait             │
//! │  (level geometry + region reads)        │
//! └────────────────────┬────────────────────┘
//!                      │ opened by
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           SlideBackend Trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//!           ┌─────────────────────┐
//!           │  ImageSlideBackend  │
//!           │  (local rasters)    │
//!           └─────────────────────┘
//! ```

mod backend;
mod image_backend;

pub use backend::{SlideBackend, SlideHandle};
pub use image_backend::{ImageSlide, ImageSlideBackend, DEFAULT_MIN_LEVEL_SIZE};
