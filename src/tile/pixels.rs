//! Pixel buffer helpers.

use image::{Rgb, RgbImage, RgbaImage};

/// Drop the trailing alpha channel of a region, keeping color channels only.
///
/// Color samples are copied as-is; they are not premultiplied by alpha.
pub fn strip_alpha(region: &RgbaImage) -> RgbImage {
    let (width, height) = region.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = region.get_pixel(x, y).0;
        Rgb([r, g, b])
    })
}
