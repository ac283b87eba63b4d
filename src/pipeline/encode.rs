//! Image encoding: cached rasters → PNG previews and PDF image streams.
//!
//! PDF cannot embed a PNG file as-is, so the exporter stores raw 8-bit RGB
//! samples zlib-compressed under `/FlateDecode`. This is lossless and keeps
//! text edges crisp, which JPEG (`/DCTDecode`) would smear.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, RgbImage};
use std::io::{Cursor, Write};
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded PNG → {} bytes", buf.len());
    Ok(buf)
}

/// Zlib-compress the raw RGB samples of `img` for a `/FlateDecode` image stream.
pub fn encode_flate_rgb(img: &RgbImage) -> std::io::Result<Vec<u8>> {
    let raw = img.as_raw();
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 4), Compression::default());
    encoder.write_all(raw)?;
    let compressed = encoder.finish()?;
    debug!(
        "Compressed {}x{} raster: {} → {} bytes",
        img.width(),
        img.height(),
        raw.len(),
        compressed.len()
    );
    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use image::Rgb;
    use std::io::Read;

    #[test]
    fn encode_small_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])));
        let data = encode_png(&img).expect("encode should succeed");
        assert_eq!(&data[1..4], b"PNG");
        let back = image::load_from_memory(&data).expect("valid png").to_rgb8();
        assert_eq!(back.dimensions(), (10, 10));
    }

    #[test]
    fn flate_stream_inflates_to_raw_samples() {
        let img = RgbImage::from_fn(6, 3, |x, y| Rgb([x as u8, y as u8, 9]));
        let compressed = encode_flate_rgb(&img).unwrap();
        let mut raw = Vec::new();
        ZlibDecoder::new(&compressed[..]).read_to_end(&mut raw).unwrap();
        assert_eq!(raw, img.as_raw().as_slice());
    }
}
