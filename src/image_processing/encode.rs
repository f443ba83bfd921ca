//! Per-format encoders.
//!
//! Each encoder takes pixel data that has already been normalised for its
//! target format and returns the complete file contents in memory. The codec
//! crates do the actual compression.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};
use std::io::Cursor;

use super::quantize::IndexedImage;
use crate::cli::TargetFormat;
use crate::error::ConvertError;

/// JPEG quality used when `--compress` is not given
pub const DEFAULT_JPEG_QUALITY: u8 = 75;
/// WebP quality used when `--compress` is not given
pub const DEFAULT_WEBP_QUALITY: u8 = 80;

/// Encode an opaque RGB buffer as baseline JPEG.
pub fn encode_jpeg(img: &RgbImage, quality: Option<u8>) -> Result<Vec<u8>, ConvertError> {
    let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ConvertError::encode(TargetFormat::Jpeg, e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode as lossy WebP.
///
/// libwebp only takes 8-bit RGB or RGBA, so grey images are promoted and
/// deeper samples narrowed. Alpha is kept when the source has it.
pub fn encode_webp(img: &DynamicImage, quality: Option<u8>) -> Result<Vec<u8>, ConvertError> {
    let quality = quality.unwrap_or(DEFAULT_WEBP_QUALITY) as f32;
    let (width, height) = (img.width(), img.height());

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    };

    encoded
        .map(|memory| memory.to_vec())
        .map_err(|e| ConvertError::encode(TargetFormat::Webp, format!("{:?}", e)))
}

/// Encode as PNG in the image's own color mode.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ConvertError> {
    // PNG has no floating point samples
    let narrowed;
    let img = match img {
        DynamicImage::ImageRgb32F(_) => {
            narrowed = DynamicImage::ImageRgb16(img.to_rgb16());
            &narrowed
        }
        DynamicImage::ImageRgba32F(_) => {
            narrowed = DynamicImage::ImageRgba16(img.to_rgba16());
            &narrowed
        }
        _ => img,
    };

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| ConvertError::encode(TargetFormat::Png, e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Encode a palette image as an 8-bit indexed PNG.
///
/// A `tRNS` chunk is written only when some palette entry is not fully
/// opaque.
pub fn encode_indexed_png(img: &IndexedImage) -> Result<Vec<u8>, ConvertError> {
    let to_err = |e: png::EncodingError| ConvertError::encode(TargetFormat::Png8, e.to_string());

    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, img.width, img.height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(img.rgb_palette());
        if let Some(trns) = img.transparency() {
            encoder.set_trns(trns);
        }

        let mut writer = encoder.write_header().map_err(to_err)?;
        writer.write_image_data(&img.indices).map_err(to_err)?;
        writer.finish().map_err(to_err)?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA, Rgb, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        })
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let jpeg = encode_jpeg(&gradient(32, 16), None).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let img = gradient(64, 64);
        let low = encode_jpeg(&img, Some(10)).unwrap();
        let high = encode_jpeg(&img, Some(100)).unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_encode_webp_riff_header() {
        let img = DynamicImage::ImageRgb8(gradient(20, 20));
        let webp = encode_webp(&img, Some(50)).unwrap();
        assert_eq!(&webp[0..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn test_encode_webp_keeps_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0])));
        let webp = encode_webp(&img, None).unwrap();
        let decoded = image::load_from_memory_with_format(&webp, ImageFormat::WebP).unwrap();
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn test_encode_webp_from_gray_alpha() {
        let img = DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(4, 4, LumaA([90, 255])));
        assert!(encode_webp(&img, Some(90)).is_ok());
    }

    #[test]
    fn test_encode_png_float_narrowed() {
        let img = DynamicImage::ImageRgb32F(image::Rgb32FImage::from_pixel(
            3,
            3,
            Rgb([0.5, 0.25, 1.0]),
        ));
        let png = encode_png(&img).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb16);
    }

    #[test]
    fn test_encode_indexed_png_header() {
        let indexed = IndexedImage {
            width: 2,
            height: 1,
            palette: vec![[255, 0, 0, 255], [0, 0, 255, 128]],
            indices: vec![0, 1],
        };
        let png_bytes = encode_indexed_png(&indexed).unwrap();

        let decoder = png::Decoder::new(Cursor::new(png_bytes));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!(info.color_type, png::ColorType::Indexed);
        assert_eq!(info.bit_depth, png::BitDepth::Eight);
        assert_eq!(info.palette.as_deref(), Some(&[255u8, 0, 0, 0, 0, 255][..]));
        assert_eq!(info.trns.as_deref(), Some(&[255u8, 128][..]));
    }
}
