//! Crop grid planning.
//!
//! Pure computation of the overlapping grid of square crops that covers a
//! slide. Nothing here touches the slide backend.
//!
//! # Example
//!
//! ```
//! use slide_crop::grid::{plan, SlideDimensions, TilingParameters};
//!
//! let params = TilingParameters::new(100, 2, 0.25).unwrap();
//! let coords = plan(
//!     SlideDimensions::new(1000, 2000),
//!     params.crop_size(),
//!     params.non_overlap_size(),
//! )
//! .unwrap();
//!
//! assert_eq!(coords.len(), 120);
//! ```

mod params;
mod planner;

pub use params::{
    TilingParameters, DEFAULT_CROP_SCALE, DEFAULT_OVERLAP_RATIO, DEFAULT_TILE_SIZE,
};
pub use planner::{
    grid_shape, plan, planned_len, CropCoordinate, SlideDimensions, MAX_GRID_LEN,
};
