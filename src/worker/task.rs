//! Crop work units and their results.

use crate::grid::{CropCoordinate, TilingParameters};
use crate::tile::Tile;

/// One crop request sent to a worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropTask {
    /// Top-left offset of the crop at the worker's level
    pub coordinate: CropCoordinate,

    /// Side of the square region to read
    pub crop_size: u32,

    /// Side of the resampled output tile
    pub tile_size: u32,

    /// Divisor mapping crop offsets to mosaic positions
    pub crop_scale: u32,
}

impl CropTask {
    /// Build a task for `coordinate` from validated tiling parameters.
    pub fn new(coordinate: CropCoordinate, params: &TilingParameters) -> Self {
        Self {
            coordinate,
            crop_size: params.crop_size(),
            tile_size: params.tile_size(),
            crop_scale: params.crop_scale(),
        }
    }

    /// Where the produced tile lands in the downsampled mosaic.
    pub fn mosaic_position(&self) -> MosaicPosition {
        let scale = self.crop_scale.max(1);
        MosaicPosition {
            x: self.coordinate.x / scale,
            y: self.coordinate.y / scale,
        }
    }
}

/// Tile offset in the downsampled mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MosaicPosition {
    pub x: u32,
    pub y: u32,
}

/// A produced tile together with its placement.
#[derive(Debug, Clone)]
pub struct CropResult {
    /// The crop this tile was produced from
    pub coordinate: CropCoordinate,

    /// `tile_size x tile_size` RGB samples
    pub tile: Tile,

    /// Placement in the mosaic
    pub position: MosaicPosition,
}
