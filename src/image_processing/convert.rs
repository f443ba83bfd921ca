use image::{ColorType, DynamicImage, ImageReader, Rgb, RgbImage};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use strum_macros::Display;

use super::encode::{encode_indexed_png, encode_jpeg, encode_png, encode_webp};
use super::quantize::quantize;
use crate::cli::TargetFormat;
use crate::error::{validate_compression, ConvertError};

/// Pixel layout of a decoded or encoded image.
///
/// Palette sources are expanded by the decoders, so `Palette` only shows up
/// as the output mode of png8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ColorMode {
    #[strum(to_string = "L")]
    Gray,
    #[strum(to_string = "LA")]
    GrayAlpha,
    #[strum(to_string = "RGB")]
    Rgb,
    #[strum(to_string = "RGBA")]
    Rgba,
    #[strum(to_string = "P")]
    Palette,
}

impl ColorMode {
    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::GrayAlpha | ColorMode::Rgba)
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => ColorMode::Gray,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayAlpha,
            c if c.has_alpha() => ColorMode::Rgba,
            _ => ColorMode::Rgb,
        }
    }
}

/// What a successful conversion produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub path: PathBuf,
    pub source_mode: ColorMode,
    pub output_mode: ColorMode,
    pub bytes_written: usize,
}

/// Convert one image file.
///
/// Returns the path that was written. See [`convert_image`] for details.
pub fn convert(
    source: &Path,
    destination: &Path,
    format: TargetFormat,
    compression: Option<u32>,
) -> Result<PathBuf, ConvertError> {
    let quality = validate_compression(compression)?;
    convert_image(source, destination, format, quality).map(|converted| converted.path)
}

/// Decode `source`, normalise it for `format` and write it to `destination`.
///
/// `quality` is only honoured by the lossy formats. The destination's parent
/// directory is created if needed, and the file is replaced atomically so a
/// failed run never leaves a truncated image behind.
pub fn convert_image(
    source: &Path,
    destination: &Path,
    format: TargetFormat,
    quality: Option<u8>,
) -> Result<ConvertedImage, ConvertError> {
    if !source.exists() {
        return Err(ConvertError::MissingSource(source.to_path_buf()));
    }

    let img = decode(source)?;
    let source_mode = ColorMode::from(img.color());
    let (bytes, output_mode) = encode_for_format(&img, format, quality)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConvertError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    write_atomically(destination, &bytes)?;

    Ok(ConvertedImage {
        path: destination.to_path_buf(),
        source_mode,
        output_mode,
        bytes_written: bytes.len(),
    })
}

/// Decode by file extension; the file handle is dropped before returning.
fn decode(path: &Path) -> Result<DynamicImage, ConvertError> {
    let to_err = |source| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(|e| to_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_err)
}

/// Apply the per-format mode rules and encode.
pub fn encode_for_format(
    img: &DynamicImage,
    format: TargetFormat,
    quality: Option<u8>,
) -> Result<(Vec<u8>, ColorMode), ConvertError> {
    match format {
        TargetFormat::Jpeg => {
            let rgb = prepare_for_jpeg(img);
            Ok((encode_jpeg(&rgb, quality)?, ColorMode::Rgb))
        }
        TargetFormat::Webp => {
            let mode = if ColorMode::from(img.color()).has_alpha() {
                ColorMode::Rgba
            } else {
                ColorMode::Rgb
            };
            Ok((encode_webp(img, quality)?, mode))
        }
        // quality is accepted but has no meaning for PNG
        TargetFormat::Png => Ok((encode_png(img)?, ColorMode::from(img.color()))),
        TargetFormat::Png8 => {
            let indexed = quantize(img);
            Ok((encode_indexed_png(&indexed)?, ColorMode::Palette))
        }
    }
}

/// JPEG has no alpha: composite over white if there is any, else plain RGB.
pub fn prepare_for_jpeg(img: &DynamicImage) -> RgbImage {
    if img.color().has_alpha() {
        flatten_onto_white(img)
    } else {
        img.to_rgb8()
    }
}

/// Blend every pixel onto an opaque white background using its alpha.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    out
}

/// Write through a hidden, uniquely named sibling file and rename it into
/// place. Concurrent writers to the same destination never share a temp file.
fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let to_err = |source| ConvertError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Dropping the temp file on any error path removes it
    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".partial")
        .tempfile_in(parent)
        .map_err(to_err)?;
    temp.write_all(bytes).map_err(to_err)?;

    // Temp files are created owner-only; outputs get ordinary file permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(to_err)?;
    }

    temp.persist(destination).map_err(|e| to_err(e.error))?;
    Ok(())
}
