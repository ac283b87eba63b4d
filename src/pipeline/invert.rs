//! Colour inversion: the "dark mode" transform.
//!
//! Every channel value `v` becomes `max - v`, where `max` is the channel's
//! largest representable value (255 for 8-bit, 65535 for 16-bit). Alpha,
//! where a pixel type has it, is left alone. The transform is its own
//! inverse: applying it twice reproduces the input pixel-exactly.

use crate::error::PageError;
use image::{imageops, ImageBuffer, Pixel, RgbImage};

/// Invert an RGB raster, returning a new image of identical dimensions.
pub fn invert(img: &RgbImage) -> RgbImage {
    invert_buffer(img)
}

/// Invert any `image` pixel buffer.
pub fn invert_buffer<P: Pixel>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let mut out = img.clone();
    imageops::invert(&mut out);
    out
}

/// Invert a freshly rendered page raster.
///
/// A zero-area bitmap means the renderer produced nothing usable; that is
/// reported as a page failure rather than cached as an empty image.
pub fn invert_page(page_num: usize, img: &RgbImage) -> Result<RgbImage, PageError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(PageError::InvertFailed {
            page: page_num,
            detail: format!("empty bitmap ({}x{})", img.width(), img.height()),
        });
    }
    Ok(invert(img))
}
