//! Decoding backend traits.
//!
//! A [`SlideBackend`] opens slides; each open produces a [`SlideHandle`]
//! bound to one resource. Crop workers own exactly one handle each, so
//! implementations are free to keep per-handle state (decode caches, file
//! descriptors) without any locking between workers.

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::CropError;

// =============================================================================
// SlideHandle Trait
// =============================================================================

/// An open slide.
///
/// Level 0 is the highest resolution. Region origins passed to
/// [`SlideHandle::read_region`] are expressed in the level-0 reference
/// frame, while the region size is expressed in pixels of the requested
/// level.
#[async_trait]
pub trait SlideHandle: Send + Sync {
    /// Number of pyramid levels.
    fn level_count(&self) -> usize;

    /// Dimensions of a level as `(width, height)`.
    ///
    /// Returns `None` if the level is out of range.
    fn level_dimensions(&self, level: usize) -> Option<(u32, u32)>;

    /// Downsample factor of a level relative to level 0.
    ///
    /// Returns `None` if the level is out of range.
    fn level_downsample(&self, level: usize) -> Option<f64>;

    /// Read a region of `size = (width, height)` pixels at `level`.
    ///
    /// The returned buffer carries a trailing alpha channel which callers
    /// discard.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::RegionRead`] if the region falls outside the
    /// level or the underlying data cannot be decoded.
    async fn read_region(
        &self,
        origin: (u32, u32),
        level: usize,
        size: (u32, u32),
    ) -> Result<RgbaImage, CropError>;
}

// =============================================================================
// SlideBackend Trait
// =============================================================================

/// Opens slides from a resource locator.
#[async_trait]
pub trait SlideBackend: Send + Sync + 'static {
    /// The handle type produced by [`SlideBackend::open`].
    type Handle: SlideHandle + 'static;

    /// Open the slide at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::SlideOpen`] if the path is invalid or the format
    /// is not supported.
    async fn open(&self, path: &str) -> Result<Self::Handle, CropError>;
}
